//! Working Memory API Handlers
//!
//! HTTP handlers for the task-scoped, TTL-bound context tier.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::working_dto::*},
    error::AppError,
    models::working::WorkingUpsert,
    observability::StoreTier,
};

/// Store (insert or merge) a working-memory context
///
/// POST /api/v1/memory/working
pub async fn store_working(
    State(state): State<AppState>,
    Json(request): Json<StoreWorkingRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        "Upserting working context {} for {}/{}",
        request.context_type, request.agent_name, request.session_id
    );

    let upsert = WorkingUpsert {
        agent_name: request.agent_name,
        session_id: request.session_id,
        context_type: request.context_type,
        context_data: request.context_data,
        ttl_seconds: request.ttl_seconds,
    };
    upsert.validate()?;

    let expires_at = state.working_repository.upsert(&upsert).await?;
    state.metrics.record_store(StoreTier::Working);

    Ok(Json(StoreWorkingResponse {
        status: "stored".to_string(),
        expires_at,
    }))
}

/// Retrieve working memory: one context type, or all for the session
///
/// GET /api/v1/memory/working
pub async fn get_working(
    State(state): State<AppState>,
    Query(params): Query<GetWorkingParams>,
) -> Result<Response, AppError> {
    if let Some(context_type) = &params.context_type {
        let context = state
            .working_repository
            .get_one(&params.agent_name, &params.session_id, context_type)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("working memory not found or expired".to_string())
            })?;

        return Ok(Json(WorkingContextView::from(context)).into_response());
    }

    let contexts = state
        .working_repository
        .get_all(&params.agent_name, &params.session_id)
        .await?;

    let response = WorkingContextListResponse {
        agent: params.agent_name,
        session: params.session_id,
        contexts: contexts.into_iter().map(Into::into).collect(),
    };

    Ok(Json(response).into_response())
}

/// Clear all working memory for a session, expired or not
///
/// DELETE /api/v1/memory/working
pub async fn clear_working(
    State(state): State<AppState>,
    Query(params): Query<ClearWorkingParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        "Clearing working memory for {}/{}",
        params.agent_name, params.session_id
    );

    state
        .working_repository
        .clear(&params.agent_name, &params.session_id)
        .await?;

    Ok(Json(ClearWorkingResponse {
        status: "cleared".to_string(),
    }))
}
