//! Entity Memory API Handlers
//!
//! HTTP handlers for the knowledge-graph tier: merge-on-write upsert,
//! composite-key lookup and filtered search.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::entity_dto::*},
    error::AppError,
    models::entity::{EntitySearchFilter, EntityUpsert},
    models::memory::{DEFAULT_QUERY_LIMIT, validate_importance},
    observability::StoreTier,
};

/// Store (insert or merge) an entity
///
/// POST /api/v1/memory/entities
pub async fn store_entity(
    State(state): State<AppState>,
    Json(request): Json<StoreEntityRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        "Upserting entity {}/{} for agent {:?}",
        request.entity_type, request.entity_id, request.agent_name
    );

    let entity = EntityUpsert {
        entity_type: request.entity_type,
        entity_id: request.entity_id,
        entity_name: request.entity_name,
        attributes: request.attributes,
        relationships: request.relationships,
        agent_name: request.agent_name,
        importance: request.importance,
    };
    entity.validate()?;

    state.entity_repository.upsert(&entity).await?;
    state.metrics.record_store(StoreTier::Entity);

    Ok(Json(StoreEntityResponse {
        status: "stored".to_string(),
        entity_id: entity.entity_id,
    }))
}

/// Retrieve an entity by composite key
///
/// GET /api/v1/memory/entities/:entity_type/:entity_id
pub async fn get_entity(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    Query(params): Query<GetEntityParams>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Reading entity {}/{}", entity_type, entity_id);

    let record = state
        .entity_repository
        .get(&entity_type, &entity_id, params.agent_name.as_deref())
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Entity not found: {}/{}", entity_type, entity_id))
        })?;

    Ok(Json(EntityView::from(record)))
}

/// Search entities by type, name substring, agent and importance
///
/// GET /api/v1/memory/entities
pub async fn search_entities(
    State(state): State<AppState>,
    Query(params): Query<SearchEntityParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(min_importance) = params.min_importance {
        validate_importance(min_importance)?;
    }

    let filter = EntitySearchFilter {
        entity_type: params.entity_type,
        name_contains: params.name_contains,
        agent_name: params.agent_name,
        min_importance: params.min_importance.unwrap_or(0.0),
        limit: params.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
    };

    let records = state.entity_repository.search(&filter).await?;
    let entities: Vec<EntityView> = records.into_iter().map(Into::into).collect();

    Ok(Json(SearchEntityResponse {
        total: entities.len(),
        entities,
    }))
}
