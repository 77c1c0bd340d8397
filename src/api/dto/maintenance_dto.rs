//! 维护操作 DTO
//!
//! 定义整合与清理端点的请求和响应数据结构。

use serde::{Deserialize, Serialize};

/// 触发整合请求
#[derive(Debug, Deserialize)]
pub struct ConsolidateRequest {
    /// 所属 Agent
    pub agent_name: String,
    /// 会话 ID
    pub session_id: String,
}

/// 触发整合响应（异步，已接受）
#[derive(Debug, Serialize)]
pub struct ConsolidateResponse {
    /// 状态
    pub status: String,
}

/// 清理响应
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    /// 状态
    pub status: String,
    /// 删除的过期工作记忆条数
    pub expired_working_removed: u64,
    /// 归档清除的对话记忆条数
    pub archived_count: u64,
}
