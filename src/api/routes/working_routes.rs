//! Working Memory Routes
//!
//! 定义工作记忆层的 API 路由。

use crate::api::handlers::working_handler::*;
use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::api::app_state::AppState;

/// 创建工作记忆路由器
pub fn create_working_router() -> Router<AppState> {
    Router::new()
        .route("/working", post(store_working))
        .route("/working", get(get_working))
        .route("/working", delete(clear_working))
}
