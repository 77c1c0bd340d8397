//! API 模块
//!
//! 提供 REST API 支持（查询门面）。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::app_state::AppState;

pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::short_term_routes::create_short_term_router())
        .merge(routes::conversation_routes::create_conversation_router())
        .merge(routes::entity_routes::create_entity_router())
        .merge(routes::working_routes::create_working_router())
        .merge(routes::search_routes::create_search_router())
        .merge(routes::maintenance_routes::create_maintenance_router());

    Router::new()
        .nest("/api/v1/memory", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(axum::middleware::from_fn_with_state(
                    app_state.clone(),
                    middleware::request_context_middleware,
                ))
                .layer(axum::middleware::from_fn(
                    middleware::security_headers_middleware,
                )),
        )
        .with_state(app_state)
}
