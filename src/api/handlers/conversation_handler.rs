//! Conversation Memory API Handlers
//!
//! HTTP handlers for the durable event log: append, filtered retrieval
//! and the cache-accelerated recent-messages read.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::conversation_dto::*},
    error::AppError,
    models::memory::{MemoryFilter, NewMemoryRecord, validate_importance},
    observability::StoreTier,
    storage::cache::RecentEntry,
};

/// Store a conversation record
///
/// POST /api/v1/memory/conversations
pub async fn store_conversation(
    State(state): State<AppState>,
    Json(request): Json<StoreConversationRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        "Storing conversation record for {}/{}",
        request.agent_name, request.session_id
    );

    let record = NewMemoryRecord {
        session_id: request.session_id,
        agent_name: request.agent_name,
        user_id: request.user_id,
        message_role: request.role,
        content: request.content,
        metadata: request.metadata,
        importance_score: request.importance_score,
        memory_type: request.memory_type,
    };
    record.validate()?;

    let memory_id = state.memory_repository.append(&record).await?;

    // 持久写入成功后推送镜像；缓存故障不回传
    let entry = RecentEntry::from_stored(memory_id, record.message_role, &record.content);
    state
        .cache
        .push_recent(&record.agent_name, &record.session_id, &entry)
        .await;

    state.metrics.record_store(StoreTier::Conversation);

    Ok((
        StatusCode::CREATED,
        Json(StoreConversationResponse {
            status: "stored".to_string(),
            memory_id,
        }),
    ))
}

/// Retrieve conversation history with conjunctive filters
///
/// GET /api/v1/memory/conversations
pub async fn retrieve_conversation(
    State(state): State<AppState>,
    Query(params): Query<RetrieveConversationParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(min_importance) = params.min_importance {
        validate_importance(min_importance)?;
    }

    let filter = params.into_filter();
    let records = state.memory_repository.query(&filter).await?;

    let conversations: Vec<ConversationView> = records.into_iter().map(Into::into).collect();

    Ok(Json(RetrieveConversationResponse {
        total: conversations.len(),
        conversations,
    }))
}

/// Read the most recent messages of a session, cache first
///
/// GET /api/v1/memory/conversations/recent
pub async fn recent_conversation(
    State(state): State<AppState>,
    Query(params): Query<RecentConversationParams>,
) -> Result<impl IntoResponse, AppError> {
    if params.session_id.is_empty() || params.agent_name.is_empty() {
        return Err(AppError::Validation(
            "session_id and agent_name are required".to_string(),
        ));
    }

    if let Some(entries) = state
        .cache
        .recent(&params.agent_name, &params.session_id, params.limit)
        .await
    {
        state.metrics.record_cache_hit();
        let messages: Vec<RecentMessageView> = entries.into_iter().map(Into::into).collect();
        return Ok(Json(RecentConversationResponse {
            source: "cache".to_string(),
            total: messages.len(),
            messages,
        }));
    }

    // 缓存未命中：回落到持久层
    state.metrics.record_cache_miss();
    let filter = MemoryFilter {
        agent_name: Some(params.agent_name),
        session_id: Some(params.session_id),
        limit: params.limit,
        ..MemoryFilter::new()
    };
    let records = state.memory_repository.query(&filter).await?;
    let messages: Vec<RecentMessageView> = records.into_iter().map(Into::into).collect();

    Ok(Json(RecentConversationResponse {
        source: "durable".to_string(),
        total: messages.len(),
        messages,
    }))
}
