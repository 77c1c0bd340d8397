//! 搜索 DTO
//!
//! 定义子串搜索（语义搜索占位）的请求和响应数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::memory::MemoryRecord;

/// 默认搜索条数上限
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// 搜索请求
#[derive(Debug, Deserialize)]
pub struct SemanticSearchRequest {
    /// 查询文本
    pub query: String,
    /// Agent 筛选
    pub agent_name: Option<String>,
    /// 条数上限
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

/// 搜索结果项
#[derive(Debug, Serialize)]
pub struct SearchResultView {
    /// 记录 ID
    pub id: i64,
    /// 所属 Agent
    pub agent: String,
    /// 内容
    pub content: String,
    /// 重要性评分
    pub importance: f64,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl From<MemoryRecord> for SearchResultView {
    fn from(record: MemoryRecord) -> Self {
        Self {
            id: record.id,
            agent: record.agent_name,
            content: record.content,
            importance: record.importance_score,
            created_at: record.created_at,
        }
    }
}

/// 搜索响应
#[derive(Debug, Serialize)]
pub struct SemanticSearchResponse {
    /// 查询文本
    pub query: String,
    /// 结果列表
    pub results: Vec<SearchResultView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_to_ten() {
        let request: SemanticSearchRequest =
            serde_json::from_str(r#"{"query":"deploy"}"#).unwrap();
        assert_eq!(request.limit, DEFAULT_SEARCH_LIMIT);
        assert!(request.agent_name.is_none());
    }
}
