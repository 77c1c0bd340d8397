//! 工作记忆 DTO
//!
//! 定义工作记忆层的请求和响应数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::working::{DEFAULT_WORKING_TTL_SECS, WorkingContext};

fn default_working_ttl() -> u64 {
    DEFAULT_WORKING_TTL_SECS
}

/// 写入工作记忆请求
#[derive(Debug, Deserialize)]
pub struct StoreWorkingRequest {
    /// 所属 Agent
    pub agent_name: String,
    /// 会话 ID
    pub session_id: String,
    /// 上下文类型
    pub context_type: String,
    /// 上下文数据
    pub context_data: HashMap<String, serde_json::Value>,
    /// TTL（秒）
    #[serde(default = "default_working_ttl")]
    pub ttl_seconds: u64,
}

/// 写入工作记忆响应
#[derive(Debug, Serialize)]
pub struct StoreWorkingResponse {
    /// 状态
    pub status: String,
    /// 新的过期时间
    pub expires_at: DateTime<Utc>,
}

/// 读取工作记忆查询参数
#[derive(Debug, Deserialize)]
pub struct GetWorkingParams {
    pub agent_name: String,
    pub session_id: String,
    /// 指定时返回单条记录；省略时返回会话下全部未过期记录
    pub context_type: Option<String>,
}

/// 单条工作记忆视图
#[derive(Debug, Serialize)]
pub struct WorkingContextView {
    /// 上下文类型
    pub context_type: String,
    /// 上下文数据
    pub context_data: HashMap<String, serde_json::Value>,
    /// 过期时间
    pub expires_at: DateTime<Utc>,
}

impl From<WorkingContext> for WorkingContextView {
    fn from(context: WorkingContext) -> Self {
        Self {
            context_type: context.context_type,
            context_data: context.context_data,
            expires_at: context.expires_at,
        }
    }
}

/// 列表项视图
#[derive(Debug, Serialize)]
pub struct WorkingContextItem {
    /// 上下文类型
    #[serde(rename = "type")]
    pub context_type: String,
    /// 上下文数据
    #[serde(rename = "data")]
    pub context_data: HashMap<String, serde_json::Value>,
    /// 过期时间
    pub expires_at: DateTime<Utc>,
}

impl From<WorkingContext> for WorkingContextItem {
    fn from(context: WorkingContext) -> Self {
        Self {
            context_type: context.context_type,
            context_data: context.context_data,
            expires_at: context.expires_at,
        }
    }
}

/// 会话级工作记忆响应
#[derive(Debug, Serialize)]
pub struct WorkingContextListResponse {
    /// 所属 Agent
    pub agent: String,
    /// 会话 ID
    pub session: String,
    /// 上下文列表
    pub contexts: Vec<WorkingContextItem>,
}

/// 清空工作记忆查询参数
#[derive(Debug, Deserialize)]
pub struct ClearWorkingParams {
    pub agent_name: String,
    pub session_id: String,
}

/// 清空工作记忆响应
#[derive(Debug, Serialize)]
pub struct ClearWorkingResponse {
    /// 状态
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_defaults_to_one_hour() {
        let request: StoreWorkingRequest = serde_json::from_str(
            r#"{"agent_name":"planner","session_id":"s1","context_type":"current_task","context_data":{}}"#,
        )
        .unwrap();
        assert_eq!(request.ttl_seconds, DEFAULT_WORKING_TTL_SECS);
    }

    #[test]
    fn test_list_item_wire_names() {
        let item = WorkingContextItem {
            context_type: "current_task".into(),
            context_data: HashMap::new(),
            expires_at: Utc::now(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("type").is_some());
        assert!(json.get("data").is_some());
        assert!(json.get("context_type").is_none());
    }
}
