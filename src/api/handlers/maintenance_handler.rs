//! Maintenance API Handlers
//!
//! Consolidation trigger (async, fire-and-forget) and the cleanup sweep.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::maintenance_dto::*},
    error::AppError,
    services::consolidation::spawn_consolidation,
};

/// Trigger a consolidation run for (agent, session)
///
/// POST /api/v1/memory/consolidate
pub async fn consolidate(
    State(state): State<AppState>,
    Json(request): Json<ConsolidateRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.agent_name.is_empty() || request.session_id.is_empty() {
        return Err(AppError::Validation(
            "agent_name and session_id are required".to_string(),
        ));
    }

    debug!(
        "Scheduling consolidation for {}/{}",
        request.agent_name, request.session_id
    );
    state.metrics.record_consolidation();

    spawn_consolidation(
        state.consolidation_service.clone(),
        request.agent_name,
        request.session_id,
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(ConsolidateResponse {
            status: "consolidation_started".to_string(),
        }),
    ))
}

/// Run the cleanup sweeps and report removed counts
///
/// POST /api/v1/memory/cleanup
pub async fn cleanup(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let report = state.cleanup_service.run().await?;
    state.metrics.record_cleanup();

    Ok(Json(CleanupResponse {
        status: "cleaned".to_string(),
        expired_working_removed: report.expired_working_removed,
        archived_count: report.conversations_archived,
    }))
}
