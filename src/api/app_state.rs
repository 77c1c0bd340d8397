use std::sync::Arc;

use crate::models::entity_repository::EntityRepository;
use crate::models::memory_repository::MemoryRepository;
use crate::models::working_repository::WorkingMemoryRepository;
use crate::observability::AppMetrics;
use crate::services::cleanup::CleanupService;
use crate::services::consolidation::ConsolidationService;
use crate::storage::cache::CacheStore;
use crate::storage::surrealdb::SurrealPool;

/// Application state containing all shared tiers and services
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db_pool: SurrealPool,
    /// Short-term cache tier (best-effort)
    pub cache: CacheStore,
    /// Conversation memory repository
    pub memory_repository: Arc<dyn MemoryRepository>,
    /// Entity memory repository
    pub entity_repository: Arc<dyn EntityRepository>,
    /// Working memory repository
    pub working_repository: Arc<dyn WorkingMemoryRepository>,
    /// Background consolidation engine
    pub consolidation_service: Arc<dyn ConsolidationService>,
    /// Cleanup sweeps
    pub cleanup_service: Arc<dyn CleanupService>,
    /// Application metrics
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db_pool", &"SurrealPool")
            .field("cache", &"CacheStore")
            .field("memory_repository", &"Arc<dyn MemoryRepository>")
            .field("entity_repository", &"Arc<dyn EntityRepository>")
            .field("working_repository", &"Arc<dyn WorkingMemoryRepository>")
            .field("consolidation_service", &"Arc<dyn ConsolidationService>")
            .field("cleanup_service", &"Arc<dyn CleanupService>")
            .field("metrics", &"Arc<AppMetrics>")
            .finish()
    }
}

impl AppState {
    /// Create new application state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_pool: SurrealPool,
        cache: CacheStore,
        memory_repository: Arc<dyn MemoryRepository>,
        entity_repository: Arc<dyn EntityRepository>,
        working_repository: Arc<dyn WorkingMemoryRepository>,
        consolidation_service: Box<dyn ConsolidationService>,
        cleanup_service: Box<dyn CleanupService>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            db_pool,
            cache,
            memory_repository,
            entity_repository,
            working_repository,
            consolidation_service: Arc::from(consolidation_service),
            cleanup_service: Arc::from(cleanup_service),
            metrics,
        }
    }
}
