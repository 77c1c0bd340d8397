//! 服务模块

pub mod cleanup;
pub mod consolidation;

pub use cleanup::{CleanupReport, CleanupService, create_cleanup_service};
pub use consolidation::{
    ConsolidationOutcome, ConsolidationService, create_consolidation_service,
    spawn_consolidation,
};
