//! Search API Handlers
//!
//! Case-insensitive substring match over conversation content, executed
//! on the durable substrate. A placeholder for embedding-based ranking.

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::search_dto::*},
    error::AppError,
};

/// Search conversation memories
///
/// POST /api/v1/memory/search
pub async fn semantic_search(
    State(state): State<AppState>,
    Json(request): Json<SemanticSearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.query.is_empty() {
        return Err(AppError::Validation("query cannot be empty".to_string()));
    }

    debug!("Searching conversations for {:?}", request.query);
    state.metrics.record_search();

    let records = state
        .memory_repository
        .semantic_search(&request.query, request.agent_name.as_deref(), request.limit)
        .await?;

    let results: Vec<SearchResultView> = records.into_iter().map(Into::into).collect();

    Ok(Json(SemanticSearchResponse {
        query: request.query,
        results,
    }))
}
