//! 短期记忆 DTO
//!
//! 定义短期键值层的请求和响应数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::storage::cache::{DEFAULT_SHORT_TERM_TTL_SECS, ShortTermEnvelope};

fn default_short_term_ttl() -> u64 {
    DEFAULT_SHORT_TERM_TTL_SECS
}

/// 写入短期记忆请求
#[derive(Debug, Deserialize)]
pub struct StoreShortTermRequest {
    /// 会话 ID
    pub session_id: String,
    /// 所属 Agent
    pub agent_name: String,
    /// 键
    pub key: String,
    /// 数据
    pub data: HashMap<String, serde_json::Value>,
    /// TTL（秒）
    #[serde(default = "default_short_term_ttl")]
    pub ttl_seconds: u64,
}

/// 写入短期记忆响应
#[derive(Debug, Serialize)]
pub struct StoreShortTermResponse {
    /// 状态
    pub status: String,
    /// 缓存键
    pub cache_key: String,
    /// 剩余有效期（秒）
    pub expires_in_seconds: u64,
}

/// 读取短期记忆查询参数
#[derive(Debug, Deserialize)]
pub struct GetShortTermParams {
    pub session_id: String,
    pub agent_name: String,
    pub key: String,
}

/// 短期记忆响应
#[derive(Debug, Serialize)]
pub struct ShortTermResponse {
    /// 数据
    pub data: HashMap<String, serde_json::Value>,
    /// 写入时间
    pub stored_at: DateTime<Utc>,
    /// 所属 Agent
    pub agent: String,
}

impl From<ShortTermEnvelope> for ShortTermResponse {
    fn from(envelope: ShortTermEnvelope) -> Self {
        Self {
            data: envelope.data,
            stored_at: envelope.stored_at,
            agent: envelope.agent,
        }
    }
}

/// 键列表查询参数
#[derive(Debug, Deserialize)]
pub struct ListShortTermParams {
    pub session_id: String,
    pub agent_name: String,
}

/// 键列表响应
#[derive(Debug, Serialize)]
pub struct ListShortTermResponse {
    /// 会话 ID
    pub session_id: String,
    /// 所属 Agent
    pub agent: String,
    /// 键列表
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_defaults_to_thirty_minutes() {
        let request: StoreShortTermRequest = serde_json::from_str(
            r#"{"session_id":"s1","agent_name":"planner","key":"scratch","data":{}}"#,
        )
        .unwrap();
        assert_eq!(request.ttl_seconds, DEFAULT_SHORT_TERM_TTL_SECS);
    }
}
