//! 实体记忆数据模型
//!
//! 稀疏知识图谱节点：以 (entity_type, entity_id, agent_name) 为复合键，
//! 重复写入时属性做浅层合并、关系整体替换、提及计数加一。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::memory::validate_importance;

/// 实体记忆记录（持久层行）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    /// 实体类型（person, project, task, concept, tool ...）
    pub entity_type: String,

    /// 实体 ID
    pub entity_id: String,

    /// 展示名称
    pub entity_name: String,

    /// 属性字典（任意键值对，语义上是事实集合）
    pub attributes: HashMap<String, serde_json::Value>,

    /// 关系映射（键 -> 其他实体 ID 列表）
    pub relationships: Option<HashMap<String, Vec<String>>>,

    /// 所属 Agent（缺省表示全局实体）
    pub agent_name: Option<String>,

    /// 重要性评分 (0.0-1.0)
    pub importance: f64,

    /// 提及次数（>= 1）
    pub mention_count: u64,

    /// 最后提及时间
    pub last_mentioned: DateTime<Utc>,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 待写入（插入或合并）的实体
#[derive(Debug, Clone)]
pub struct EntityUpsert {
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: String,
    pub attributes: HashMap<String, serde_json::Value>,
    pub relationships: Option<HashMap<String, Vec<String>>>,
    pub agent_name: Option<String>,
    pub importance: f64,
}

impl EntityUpsert {
    /// 边界验证
    pub fn validate(&self) -> Result<()> {
        validate_importance(self.importance)?;

        if self.entity_type.is_empty() {
            return Err(AppError::Validation("entity_type cannot be empty".into()));
        }
        if self.entity_id.is_empty() {
            return Err(AppError::Validation("entity_id cannot be empty".into()));
        }
        if self.entity_name.is_empty() {
            return Err(AppError::Validation("entity_name cannot be empty".into()));
        }

        Ok(())
    }

    /// 复合键中的 Agent 分量；全局实体用空串占位
    pub fn agent_key(&self) -> String {
        self.agent_name.clone().unwrap_or_default()
    }
}

/// 实体检索条件（各条件为合取关系）
#[derive(Debug, Clone)]
pub struct EntitySearchFilter {
    /// 实体类型筛选
    pub entity_type: Option<String>,

    /// 名称子串（不区分大小写）
    pub name_contains: Option<String>,

    /// Agent 筛选
    pub agent_name: Option<String>,

    /// 最小重要性
    pub min_importance: f64,

    /// 条数上限
    pub limit: usize,
}

impl Default for EntitySearchFilter {
    fn default() -> Self {
        Self {
            entity_type: None,
            name_contains: None,
            agent_name: None,
            min_importance: 0.0,
            limit: crate::models::memory::DEFAULT_QUERY_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert() -> EntityUpsert {
        EntityUpsert {
            entity_type: "person".into(),
            entity_id: "nguyen_van_a".into(),
            entity_name: "Nguyễn Văn A".into(),
            attributes: HashMap::from([("dept".to_string(), serde_json::json!("eng"))]),
            relationships: None,
            agent_name: Some("hr-bot".into()),
            importance: 0.5,
        }
    }

    #[test]
    fn test_upsert_validation() {
        assert!(upsert().validate().is_ok());

        let mut bad = upsert();
        bad.importance = 2.0;
        assert!(bad.validate().is_err());

        let mut bad = upsert();
        bad.entity_id = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_agent_key_placeholder_for_global_entities() {
        assert_eq!(upsert().agent_key(), "hr-bot");

        let mut global = upsert();
        global.agent_name = None;
        assert_eq!(global.agent_key(), "");
    }

    #[test]
    fn test_search_filter_defaults() {
        let filter = EntitySearchFilter::default();
        assert_eq!(filter.limit, 50);
        assert_eq!(filter.min_importance, 0.0);
        assert!(filter.entity_type.is_none());
    }
}
