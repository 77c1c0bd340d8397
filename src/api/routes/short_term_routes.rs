//! Short-Term Memory Routes
//!
//! 定义短期记忆层的 API 路由。

use crate::api::handlers::short_term_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建短期记忆路由器
pub fn create_short_term_router() -> Router<AppState> {
    Router::new()
        .route("/short-term", post(store_short_term))
        .route("/short-term", get(get_short_term))
        .route("/short-term/keys", get(list_short_term))
}
