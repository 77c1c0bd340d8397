//! 记忆整合审计模型
//!
//! 整合引擎每应用一批衰减，就落一条审计记录。只写不改。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 整合类型：对低重要性旧记录做重要性衰减
pub const CONSOLIDATION_REDUCE_IMPORTANCE: &str = "reduce_importance";

/// 整合审计记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationLogEntry {
    /// 所属 Agent 名称
    pub agent_name: String,

    /// 整合类型
    pub consolidation_type: String,

    /// 本批涉及的对话记忆 ID
    pub source_ids: Vec<i64>,

    /// 结果摘要
    pub result: HashMap<String, serde_json::Value>,

    /// 记录时间
    pub created_at: DateTime<Utc>,
}
