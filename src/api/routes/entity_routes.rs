//! Entity Memory Routes
//!
//! 定义实体记忆层的 API 路由。

use crate::api::handlers::entity_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建实体记忆路由器
pub fn create_entity_router() -> Router<AppState> {
    Router::new()
        .route("/entities", post(store_entity))
        .route("/entities", get(search_entities))
        .route("/entities/:entity_type/:entity_id", get(get_entity))
}
