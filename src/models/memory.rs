//! 对话记忆数据模型
//!
//! 持久层的对话轮次记录：按会话/Agent/用户/时间/重要性可检索，
//! 读取时进行访问跟踪，由整合引擎按策略衰减。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AppError, Result};

/// 默认重要性评分
pub const DEFAULT_IMPORTANCE: f64 = 0.5;

/// 默认查询条数上限
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// 记忆类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MemoryType {
    /// 事件/对话记忆 - 记录具体事件、对话、重要时刻
    #[default]
    #[serde(rename = "episodic")]
    Episodic,

    /// 事实/知识记忆 - 抽象的事实、知识、概念
    #[serde(rename = "semantic")]
    Semantic,

    /// 技能/流程记忆 - 学到的技能、流程、工作模式
    #[serde(rename = "procedural")]
    Procedural,

    /// 当前任务上下文
    #[serde(rename = "working")]
    Working,
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryType::Episodic => write!(f, "episodic"),
            MemoryType::Semantic => write!(f, "semantic"),
            MemoryType::Procedural => write!(f, "procedural"),
            MemoryType::Working => write!(f, "working"),
        }
    }
}

/// 消息角色枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    #[serde(rename = "user")]
    User,

    #[serde(rename = "assistant")]
    Assistant,

    #[serde(rename = "system")]
    System,

    #[serde(rename = "tool")]
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// 对话记忆记录（持久层行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// 自增序列 ID
    pub id: i64,

    /// 会话 ID
    pub session_id: String,

    /// 所属 Agent 名称
    pub agent_name: String,

    /// 用户 ID
    pub user_id: Option<String>,

    /// 消息角色
    pub message_role: MessageRole,

    /// 原始内容
    pub content: String,

    /// 结构化元数据（不透明键值对）
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// 重要性评分 (0.0-1.0)
    pub importance_score: f64,

    /// 记忆类型
    pub memory_type: MemoryType,

    /// 创建时间（不可变）
    pub created_at: DateTime<Utc>,

    /// 最后访问时间
    pub accessed_at: DateTime<Utc>,

    /// 访问次数（单调不减）
    pub access_count: u64,
}

/// 待写入的对话记忆
#[derive(Debug, Clone)]
pub struct NewMemoryRecord {
    pub session_id: String,
    pub agent_name: String,
    pub user_id: Option<String>,
    pub message_role: MessageRole,
    pub content: String,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub importance_score: f64,
    pub memory_type: MemoryType,
}

impl NewMemoryRecord {
    /// 边界验证：越界的评分直接拒绝，不做截断
    pub fn validate(&self) -> Result<()> {
        validate_importance(self.importance_score)?;

        if self.session_id.is_empty() {
            return Err(AppError::Validation("session_id cannot be empty".into()));
        }
        if self.agent_name.is_empty() {
            return Err(AppError::Validation("agent_name cannot be empty".into()));
        }
        if self.content.is_empty() {
            return Err(AppError::Validation("content cannot be empty".into()));
        }

        Ok(())
    }
}

/// 校验重要性评分落在 [0, 1] 区间
pub fn validate_importance(score: f64) -> Result<()> {
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(AppError::Validation(format!(
            "importance score must be within [0, 1], got {}",
            score
        )));
    }
    Ok(())
}

/// 对话记忆查询条件（各条件为合取关系）
#[derive(Debug, Clone)]
pub struct MemoryFilter {
    /// Agent 名称筛选
    pub agent_name: Option<String>,

    /// 会话筛选
    pub session_id: Option<String>,

    /// 用户筛选
    pub user_id: Option<String>,

    /// 最小重要性
    pub min_importance: f64,

    /// 时间窗口（小时，只返回更新的记录）
    pub time_range_hours: Option<u32>,

    /// 条数上限
    pub limit: usize,
}

impl Default for MemoryFilter {
    fn default() -> Self {
        Self {
            agent_name: None,
            session_id: None,
            user_id: None,
            min_importance: 0.0,
            time_range_hours: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl MemoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置会话筛选
    pub fn for_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    /// 设置 Agent 筛选
    pub fn for_agent(mut self, agent_name: &str) -> Self {
        self.agent_name = Some(agent_name.to_string());
        self
    }

    /// 设置最小重要性
    pub fn with_min_importance(mut self, min_importance: f64) -> Self {
        self.min_importance = min_importance;
        self
    }

    /// 设置时间窗口
    pub fn within_hours(mut self, hours: u32) -> Self {
        self.time_range_hours = Some(hours);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn new_record(importance: f64) -> NewMemoryRecord {
        NewMemoryRecord {
            session_id: "session_1".into(),
            agent_name: "planner".into(),
            user_id: None,
            message_role: MessageRole::User,
            content: "hello".into(),
            metadata: None,
            importance_score: importance,
            memory_type: MemoryType::Episodic,
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.5)]
    #[case(1.0)]
    fn test_importance_in_range_accepted(#[case] score: f64) {
        assert!(validate_importance(score).is_ok());
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.1)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_importance_out_of_range_rejected(#[case] score: f64) {
        assert!(validate_importance(score).is_err());
    }

    #[test]
    fn test_new_record_validation() {
        assert!(new_record(0.5).validate().is_ok());
        assert!(new_record(1.5).validate().is_err());

        let mut record = new_record(0.5);
        record.content = String::new();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_filter_defaults() {
        let filter = MemoryFilter::new();
        assert_eq!(filter.limit, DEFAULT_QUERY_LIMIT);
        assert_eq!(filter.min_importance, 0.0);
        assert!(filter.session_id.is_none());
        assert!(filter.time_range_hours.is_none());
    }

    #[test]
    fn test_filter_builder() {
        let filter = MemoryFilter::new()
            .for_session("session_1")
            .for_agent("planner")
            .with_min_importance(0.3)
            .within_hours(24);

        assert_eq!(filter.session_id.as_deref(), Some("session_1"));
        assert_eq!(filter.agent_name.as_deref(), Some("planner"));
        assert_eq!(filter.min_importance, 0.3);
        assert_eq!(filter.time_range_hours, Some(24));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(MemoryType::Episodic.to_string(), "episodic");
        assert_eq!(MessageRole::Tool.to_string(), "tool");
        assert_eq!(
            serde_json::to_string(&MemoryType::Procedural).unwrap(),
            "\"procedural\""
        );
        assert_eq!(
            serde_json::from_str::<MessageRole>("\"assistant\"").unwrap(),
            MessageRole::Assistant
        );
    }
}
