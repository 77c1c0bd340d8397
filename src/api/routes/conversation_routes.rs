//! Conversation Memory Routes
//!
//! 定义对话记忆层的 API 路由。

use crate::api::handlers::conversation_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建对话记忆路由器
pub fn create_conversation_router() -> Router<AppState> {
    Router::new()
        .route("/conversations", post(store_conversation))
        .route("/conversations", get(retrieve_conversation))
        .route("/conversations/recent", get(recent_conversation))
}
