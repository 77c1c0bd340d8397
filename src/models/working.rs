//! 工作记忆数据模型
//!
//! 任务级、带 TTL 的上下文数据：以 (agent_name, session_id, context_type)
//! 为复合键，重复写入时合并而非替换，并把过期时间前移到 now + ttl。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AppError, Result};

/// 默认 TTL：1 小时
pub const DEFAULT_WORKING_TTL_SECS: u64 = 3600;

/// 工作记忆记录（持久层行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingContext {
    /// 所属 Agent 名称
    pub agent_name: String,

    /// 会话 ID
    pub session_id: String,

    /// 上下文类型（current_task, user_preferences, system_state ...）
    pub context_type: String,

    /// 上下文数据（任意键值对）
    pub context_data: HashMap<String, serde_json::Value>,

    /// TTL（秒）
    pub ttl_seconds: u64,

    /// 创建（或最近合并）时间
    pub created_at: DateTime<Utc>,

    /// 过期时间
    pub expires_at: DateTime<Utc>,
}

impl WorkingContext {
    /// 记录是否已过期
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// 待写入（插入或合并）的工作记忆
#[derive(Debug, Clone)]
pub struct WorkingUpsert {
    pub agent_name: String,
    pub session_id: String,
    pub context_type: String,
    pub context_data: HashMap<String, serde_json::Value>,
    pub ttl_seconds: u64,
}

impl WorkingUpsert {
    /// 边界验证
    pub fn validate(&self) -> Result<()> {
        if self.agent_name.is_empty() {
            return Err(AppError::Validation("agent_name cannot be empty".into()));
        }
        if self.session_id.is_empty() {
            return Err(AppError::Validation("session_id cannot be empty".into()));
        }
        if self.context_type.is_empty() {
            return Err(AppError::Validation("context_type cannot be empty".into()));
        }
        if self.ttl_seconds == 0 {
            return Err(AppError::Validation("ttl_seconds must be positive".into()));
        }

        Ok(())
    }

    /// 由写入时刻推算新的过期时间
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.ttl_seconds as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(ttl_seconds: u64) -> WorkingUpsert {
        WorkingUpsert {
            agent_name: "planner".into(),
            session_id: "session_1".into(),
            context_type: "current_task".into(),
            context_data: HashMap::from([("step".to_string(), serde_json::json!(3))]),
            ttl_seconds,
        }
    }

    #[test]
    fn test_upsert_validation() {
        assert!(upsert(3600).validate().is_ok());
        assert!(upsert(0).validate().is_err());

        let mut bad = upsert(3600);
        bad.context_type = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_expiry_moves_forward_from_now() {
        let now = Utc::now();
        let expiry = upsert(60).expiry_from(now);
        assert_eq!((expiry - now).num_seconds(), 60);
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let live = WorkingContext {
            agent_name: "planner".into(),
            session_id: "session_1".into(),
            context_type: "current_task".into(),
            context_data: HashMap::new(),
            ttl_seconds: 1,
            created_at: now,
            expires_at: now + Duration::seconds(1),
        };
        assert!(!live.is_expired());

        let dead = WorkingContext {
            expires_at: now - Duration::seconds(1),
            ..live
        };
        assert!(dead.is_expired());
    }
}
