//! 对话记忆 DTO
//!
//! 定义对话记忆层的请求和响应数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::memory::{
    DEFAULT_IMPORTANCE, MemoryFilter, MemoryRecord, MemoryType, MessageRole,
};
use crate::storage::cache::{RECENT_CONTENT_MAX_CHARS, RecentEntry, truncate_content};

fn default_importance() -> f64 {
    DEFAULT_IMPORTANCE
}

/// 写入对话记忆请求
#[derive(Debug, Deserialize)]
pub struct StoreConversationRequest {
    /// 会话 ID
    pub session_id: String,
    /// 所属 Agent
    pub agent_name: String,
    /// 用户 ID
    pub user_id: Option<String>,
    /// 消息角色
    pub role: MessageRole,
    /// 内容
    pub content: String,
    /// 结构化元数据
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    /// 重要性评分
    #[serde(default = "default_importance")]
    pub importance_score: f64,
    /// 记忆类型
    #[serde(default)]
    pub memory_type: MemoryType,
}

/// 写入对话记忆响应
#[derive(Debug, Serialize)]
pub struct StoreConversationResponse {
    /// 状态
    pub status: String,
    /// 新记录 ID
    pub memory_id: i64,
}

/// 检索对话记忆查询参数
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RetrieveConversationParams {
    /// Agent 筛选
    pub agent_name: Option<String>,
    /// 会话筛选
    pub session_id: Option<String>,
    /// 用户筛选
    pub user_id: Option<String>,
    /// 条数上限
    pub limit: Option<usize>,
    /// 最小重要性
    pub min_importance: Option<f64>,
    /// 时间窗口（小时）
    pub time_range_hours: Option<u32>,
}

impl RetrieveConversationParams {
    /// 转换为仓储层查询条件
    pub fn into_filter(self) -> MemoryFilter {
        let mut filter = MemoryFilter::new();
        filter.agent_name = self.agent_name;
        filter.session_id = self.session_id;
        filter.user_id = self.user_id;
        if let Some(min_importance) = self.min_importance {
            filter.min_importance = min_importance;
        }
        filter.time_range_hours = self.time_range_hours;
        if let Some(limit) = self.limit {
            filter.limit = limit;
        }
        filter
    }
}

/// 对话记忆视图
#[derive(Debug, Serialize)]
pub struct ConversationView {
    /// 记录 ID
    pub id: i64,
    /// 会话 ID
    pub session_id: String,
    /// 所属 Agent
    pub agent_name: String,
    /// 用户 ID
    pub user_id: Option<String>,
    /// 消息角色
    pub message_role: MessageRole,
    /// 内容
    pub content: String,
    /// 结构化元数据
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    /// 重要性评分
    pub importance_score: f64,
    /// 记忆类型
    pub memory_type: MemoryType,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 访问次数
    pub access_count: u64,
}

impl From<MemoryRecord> for ConversationView {
    fn from(record: MemoryRecord) -> Self {
        Self {
            id: record.id,
            session_id: record.session_id,
            agent_name: record.agent_name,
            user_id: record.user_id,
            message_role: record.message_role,
            content: record.content,
            metadata: record.metadata,
            importance_score: record.importance_score,
            memory_type: record.memory_type,
            created_at: record.created_at,
            access_count: record.access_count,
        }
    }
}

/// 检索对话记忆响应
#[derive(Debug, Serialize)]
pub struct RetrieveConversationResponse {
    /// 结果总数
    pub total: usize,
    /// 对话记忆列表
    pub conversations: Vec<ConversationView>,
}

fn default_recent_limit() -> usize {
    crate::storage::cache::RECENT_LIST_MAX
}

/// 最近对话查询参数
#[derive(Debug, Deserialize)]
pub struct RecentConversationParams {
    pub session_id: String,
    pub agent_name: String,
    /// 条数上限
    #[serde(default = "default_recent_limit")]
    pub limit: usize,
}

/// 最近对话消息视图
#[derive(Debug, Serialize)]
pub struct RecentMessageView {
    /// 记录 ID
    pub id: i64,
    /// 消息角色
    pub role: String,
    /// 截断后的内容
    pub content: String,
    /// 写入时间
    pub timestamp: DateTime<Utc>,
}

impl From<RecentEntry> for RecentMessageView {
    fn from(entry: RecentEntry) -> Self {
        Self {
            id: entry.id,
            role: entry.role,
            content: entry.content,
            timestamp: entry.timestamp,
        }
    }
}

impl From<MemoryRecord> for RecentMessageView {
    fn from(record: MemoryRecord) -> Self {
        Self {
            id: record.id,
            role: record.message_role.to_string(),
            content: truncate_content(&record.content, RECENT_CONTENT_MAX_CHARS),
            timestamp: record.created_at,
        }
    }
}

/// 最近对话响应
#[derive(Debug, Serialize)]
pub struct RecentConversationResponse {
    /// 数据来源：cache 或 durable
    pub source: String,
    /// 结果总数
    pub total: usize,
    /// 消息列表（最新在前）
    pub messages: Vec<RecentMessageView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_request_defaults() {
        let request: StoreConversationRequest = serde_json::from_str(
            r#"{"session_id":"s1","agent_name":"planner","role":"user","content":"hi"}"#,
        )
        .unwrap();
        assert_eq!(request.importance_score, DEFAULT_IMPORTANCE);
        assert_eq!(request.memory_type, MemoryType::Episodic);
        assert!(request.user_id.is_none());
    }

    #[test]
    fn test_params_into_filter_defaults() {
        let filter = RetrieveConversationParams::default().into_filter();
        assert_eq!(filter.limit, 50);
        assert_eq!(filter.min_importance, 0.0);
    }

    #[test]
    fn test_params_into_filter_passthrough() {
        let params = RetrieveConversationParams {
            agent_name: Some("planner".into()),
            session_id: Some("s1".into()),
            user_id: None,
            limit: Some(5),
            min_importance: Some(0.7),
            time_range_hours: Some(12),
        };
        let filter = params.into_filter();
        assert_eq!(filter.agent_name.as_deref(), Some("planner"));
        assert_eq!(filter.limit, 5);
        assert_eq!(filter.min_importance, 0.7);
        assert_eq!(filter.time_range_hours, Some(12));
    }
}
