//! Maintenance Routes
//!
//! 定义整合与清理的 API 路由。

use crate::api::handlers::maintenance_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建维护路由器
pub fn create_maintenance_router() -> Router<AppState> {
    Router::new()
        .route("/consolidate", post(consolidate))
        .route("/cleanup", post(cleanup))
}
