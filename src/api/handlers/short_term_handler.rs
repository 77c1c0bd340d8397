//! Short-Term Memory API Handlers
//!
//! HTTP handlers for the cache-backed short-term tier: put/get with TTL
//! and session-scoped key listing.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::short_term_dto::*},
    error::AppError,
    observability::StoreTier,
    storage::cache::ShortTermEnvelope,
};

/// Store a short-term value
///
/// POST /api/v1/memory/short-term
pub async fn store_short_term(
    State(state): State<AppState>,
    Json(request): Json<StoreShortTermRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        "Storing short-term key {} for {}/{}",
        request.key, request.agent_name, request.session_id
    );

    if request.session_id.is_empty() || request.agent_name.is_empty() || request.key.is_empty() {
        return Err(AppError::Validation(
            "session_id, agent_name and key are required".to_string(),
        ));
    }
    if request.ttl_seconds == 0 {
        return Err(AppError::Validation("ttl_seconds must be positive".to_string()));
    }

    let envelope = ShortTermEnvelope {
        data: request.data,
        stored_at: Utc::now(),
        agent: request.agent_name.clone(),
    };

    let cache_key = state
        .cache
        .put_short_term(
            &request.agent_name,
            &request.session_id,
            &request.key,
            &envelope,
            request.ttl_seconds,
        )
        .await?;

    state.metrics.record_store(StoreTier::ShortTerm);

    Ok(Json(StoreShortTermResponse {
        status: "stored".to_string(),
        cache_key,
        expires_in_seconds: request.ttl_seconds,
    }))
}

/// Retrieve a short-term value
///
/// GET /api/v1/memory/short-term
pub async fn get_short_term(
    State(state): State<AppState>,
    Query(params): Query<GetShortTermParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        "Reading short-term key {} for {}/{}",
        params.key, params.agent_name, params.session_id
    );

    match state
        .cache
        .get_short_term(&params.agent_name, &params.session_id, &params.key)
        .await
    {
        Some(envelope) => {
            state.metrics.record_cache_hit();
            Ok(Json(ShortTermResponse::from(envelope)))
        }
        None => {
            state.metrics.record_cache_miss();
            Err(AppError::NotFound(
                "short-term memory not found or expired".to_string(),
            ))
        }
    }
}

/// List short-term keys for a session
///
/// GET /api/v1/memory/short-term/keys
pub async fn list_short_term(
    State(state): State<AppState>,
    Query(params): Query<ListShortTermParams>,
) -> Result<impl IntoResponse, AppError> {
    let keys = state
        .cache
        .list_short_term_keys(&params.agent_name, &params.session_id)
        .await;

    Ok(Json(ListShortTermResponse {
        session_id: params.session_id,
        agent: params.agent_name,
        keys,
    }))
}
