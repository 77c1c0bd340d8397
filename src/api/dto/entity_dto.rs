//! 实体记忆 DTO
//!
//! 定义实体层的请求和响应数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::entity::EntityRecord;
use crate::models::memory::DEFAULT_IMPORTANCE;

fn default_importance() -> f64 {
    DEFAULT_IMPORTANCE
}

/// 写入实体请求
#[derive(Debug, Deserialize)]
pub struct StoreEntityRequest {
    /// 实体类型
    pub entity_type: String,
    /// 实体 ID
    pub entity_id: String,
    /// 展示名称
    pub entity_name: String,
    /// 属性字典
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    /// 关系映射
    pub relationships: Option<HashMap<String, Vec<String>>>,
    /// 所属 Agent（缺省为全局实体）
    pub agent_name: Option<String>,
    /// 重要性评分
    #[serde(default = "default_importance")]
    pub importance: f64,
}

/// 写入实体响应
#[derive(Debug, Serialize)]
pub struct StoreEntityResponse {
    /// 状态
    pub status: String,
    /// 实体 ID
    pub entity_id: String,
}

/// 读取实体查询参数
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GetEntityParams {
    /// Agent 筛选；省略时跨 Agent 取重要性最高者
    pub agent_name: Option<String>,
}

/// 实体视图
#[derive(Debug, Serialize)]
pub struct EntityView {
    /// 实体类型
    pub entity_type: String,
    /// 实体 ID
    pub entity_id: String,
    /// 展示名称
    pub entity_name: String,
    /// 属性字典
    pub attributes: HashMap<String, serde_json::Value>,
    /// 关系映射
    pub relationships: Option<HashMap<String, Vec<String>>>,
    /// 所属 Agent
    pub agent: Option<String>,
    /// 提及次数
    pub mention_count: u64,
    /// 重要性评分
    pub importance: f64,
    /// 最后提及时间
    pub last_mentioned: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl From<EntityRecord> for EntityView {
    fn from(record: EntityRecord) -> Self {
        Self {
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            entity_name: record.entity_name,
            attributes: record.attributes,
            relationships: record.relationships,
            agent: record.agent_name,
            mention_count: record.mention_count,
            importance: record.importance,
            last_mentioned: record.last_mentioned,
            updated_at: record.updated_at,
        }
    }
}

/// 实体检索查询参数
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SearchEntityParams {
    /// 实体类型筛选
    pub entity_type: Option<String>,
    /// 名称子串（不区分大小写）
    pub name_contains: Option<String>,
    /// Agent 筛选
    pub agent_name: Option<String>,
    /// 最小重要性
    pub min_importance: Option<f64>,
    /// 条数上限
    pub limit: Option<usize>,
}

/// 实体检索响应
#[derive(Debug, Serialize)]
pub struct SearchEntityResponse {
    /// 结果总数
    pub total: usize,
    /// 实体列表
    pub entities: Vec<EntityView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_request_defaults() {
        let request: StoreEntityRequest = serde_json::from_str(
            r#"{"entity_type":"person","entity_id":"nguyen_van_a","entity_name":"Nguyễn Văn A"}"#,
        )
        .unwrap();
        assert_eq!(request.importance, DEFAULT_IMPORTANCE);
        assert!(request.attributes.is_empty());
        assert!(request.relationships.is_none());
        assert!(request.agent_name.is_none());
    }
}
