//! API Middleware
//!
//! Request-context interceptor wrapping the dispatch path: every call is
//! tagged with a correlation id and its operation (matched route), logged
//! on entry and exit, and counted in the application metrics.

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::app_state::AppState;

/// 关联 ID 头
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Extract or mint the correlation id for a request
fn correlation_id(req: &Request<Body>) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Request-context middleware: correlation id + operation name + latency
pub async fn request_context_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let correlation_id = correlation_id(&req);
    let operation = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().clone();

    let start = std::time::Instant::now();
    state.metrics.record_connection(1);
    debug!("--> {} {} [{}]", method, operation, correlation_id);

    let mut response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    state.metrics.record_http_request(duration_ms);
    state.metrics.record_connection(-1);
    if response.status().is_server_error() {
        state.metrics.record_error();
    }

    info!(
        "<-- {} {} {} in {}ms [{}]",
        method,
        operation,
        response.status().as_u16(),
        duration_ms,
        correlation_id
    );

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Security headers middleware
pub async fn security_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}
