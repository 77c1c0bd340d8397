//! 实体记忆仓储
//!
//! 复合键 (entity_type, entity_id, agent) 直接构成记录 ID，
//! 合并写入在基座侧单语句完成，不存在读-改-写竞态窗口。

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::models::entity::{EntityRecord, EntitySearchFilter, EntityUpsert};
use crate::storage::surrealdb::SurrealPool;

const ENTITY_FIELDS: &str = "entity_type, entity_id, entity_name, attributes, relationships, \
     agent_name, importance, mention_count, last_mentioned, created_at, updated_at";

/// 插入或合并：属性做浅层并集（新键覆盖旧键、嵌套值整体替换），
/// 关系整体替换，提及计数加一，last_mentioned 前移到现在。
const UPSERT_QUERY: &str = "
    UPSERT type::thing('entity_memory', [$entity_type, $entity_id, $agent_key]) SET
        entity_type = $entity_type,
        entity_id = $entity_id,
        entity_name = $entity_name,
        attributes = object::from_entries(array::concat(
            object::entries(attributes ?? {}),
            object::entries($attributes)
        )),
        relationships = $relationships,
        agent_name = $agent_name,
        importance = $importance,
        mention_count = (mention_count ?? 0) + 1,
        last_mentioned = time::now(),
        created_at = created_at ?? time::now(),
        updated_at = time::now()
    RETURN NONE;
";

#[derive(Debug, Deserialize)]
struct EntityIdRow {
    #[allow(dead_code)]
    entity_id: String,
}

/// 实体记忆仓储 trait
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// 插入或合并一个实体（基座侧原子完成）
    async fn upsert(&self, entity: &EntityUpsert) -> Result<()>;

    /// 读取实体
    ///
    /// 省略 agent 时跨 Agent 匹配，取重要性最高者，
    /// 重要性相同再按提及次数。
    async fn get(
        &self,
        entity_type: &str,
        entity_id: &str,
        agent_name: Option<&str>,
    ) -> Result<Option<EntityRecord>>;

    /// 条件检索，按重要性、再按提及次数倒序
    async fn search(&self, filter: &EntitySearchFilter) -> Result<Vec<EntityRecord>>;

    /// 对长期未提及的低重要性实体做重要性衰减，返回受影响条数
    ///
    /// 仅在 entity_decay 配置开启时由整合引擎调用。
    async fn decay_stale(
        &self,
        agent_name: &str,
        stale_days: u32,
        importance_ceiling: f64,
        decay_factor: f64,
    ) -> Result<u64>;
}

/// 实体记忆仓储实现
#[derive(Clone)]
pub struct EntityRepositoryImpl {
    pool: SurrealPool,
}

impl EntityRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityRepository for EntityRepositoryImpl {
    async fn upsert(&self, entity: &EntityUpsert) -> Result<()> {
        let db = self.pool.inner().await;
        let entity = entity.clone();
        let agent_key = entity.agent_key();

        self.pool
            .run("entity.upsert", async move {
                db.query(UPSERT_QUERY)
                    .bind(("entity_type", entity.entity_type))
                    .bind(("entity_id", entity.entity_id))
                    .bind(("agent_key", agent_key))
                    .bind(("entity_name", entity.entity_name))
                    .bind(("attributes", entity.attributes))
                    .bind(("relationships", entity.relationships))
                    .bind(("agent_name", entity.agent_name))
                    .bind(("importance", entity.importance))
                    .await?
                    .check()?;
                Ok(())
            })
            .await
    }

    async fn get(
        &self,
        entity_type: &str,
        entity_id: &str,
        agent_name: Option<&str>,
    ) -> Result<Option<EntityRecord>> {
        let db = self.pool.inner().await;
        let entity_type = entity_type.to_string();
        let entity_id = entity_id.to_string();
        let agent_name = agent_name.map(|s| s.to_string());

        let mut conditions = vec!["entity_type = $entity_type", "entity_id = $entity_id"];
        if agent_name.is_some() {
            conditions.push("agent_name = $agent_name");
        }

        let sql = format!(
            "SELECT {} FROM entity_memory WHERE {} \
             ORDER BY importance DESC, mention_count DESC LIMIT 1;",
            ENTITY_FIELDS,
            conditions.join(" AND ")
        );

        self.pool
            .run("entity.get", async move {
                let mut response = db
                    .query(sql)
                    .bind(("entity_type", entity_type))
                    .bind(("entity_id", entity_id))
                    .bind(("agent_name", agent_name))
                    .await?;

                let rows: Vec<EntityRecord> = response.take(0)?;
                Ok(rows.into_iter().next())
            })
            .await
    }

    async fn search(&self, filter: &EntitySearchFilter) -> Result<Vec<EntityRecord>> {
        let db = self.pool.inner().await;
        let filter = filter.clone();

        let mut conditions: Vec<&str> = Vec::new();
        if filter.entity_type.is_some() {
            conditions.push("entity_type = $entity_type");
        }
        if filter.name_contains.is_some() {
            conditions
                .push("string::contains(string::lowercase(entity_name), string::lowercase($name_contains))");
        }
        if filter.agent_name.is_some() {
            conditions.push("agent_name = $agent_name");
        }
        if filter.min_importance > 0.0 {
            conditions.push("importance >= $min_importance");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {} FROM entity_memory {}\
             ORDER BY importance DESC, mention_count DESC LIMIT $limit;",
            ENTITY_FIELDS, where_clause
        );

        self.pool
            .run("entity.search", async move {
                let mut response = db
                    .query(sql)
                    .bind(("entity_type", filter.entity_type))
                    .bind(("name_contains", filter.name_contains))
                    .bind(("agent_name", filter.agent_name))
                    .bind(("min_importance", filter.min_importance))
                    .bind(("limit", filter.limit as i64))
                    .await?;

                let rows: Vec<EntityRecord> = response.take(0)?;
                Ok(rows)
            })
            .await
    }

    async fn decay_stale(
        &self,
        agent_name: &str,
        stale_days: u32,
        importance_ceiling: f64,
        decay_factor: f64,
    ) -> Result<u64> {
        let db = self.pool.inner().await;
        let agent_name = agent_name.to_string();

        let sql = "UPDATE entity_memory \
             SET importance = importance * $decay_factor, updated_at = time::now() \
             WHERE agent_name = $agent_name \
               AND last_mentioned < time::now() - duration::from::days($stale_days) \
               AND importance < $importance_ceiling \
             RETURN entity_id;";

        self.pool
            .run("entity.decay_stale", async move {
                let mut response = db
                    .query(sql)
                    .bind(("agent_name", agent_name))
                    .bind(("stale_days", stale_days))
                    .bind(("importance_ceiling", importance_ceiling))
                    .bind(("decay_factor", decay_factor))
                    .await?;

                let touched: Vec<EntityIdRow> = response.take(0)?;
                Ok(touched.len() as u64)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_query_merge_semantics() {
        // 属性并集：旧值在前、新值在后，重复键新值胜出
        assert!(UPSERT_QUERY.contains("object::from_entries(array::concat("));
        let old = UPSERT_QUERY.find("object::entries(attributes ?? {})").unwrap();
        let new = UPSERT_QUERY.find("object::entries($attributes)").unwrap();
        assert!(old < new);

        // 关系整体替换，提及计数恰好加一
        assert!(UPSERT_QUERY.contains("relationships = $relationships"));
        assert!(UPSERT_QUERY.contains("mention_count = (mention_count ?? 0) + 1"));
        assert!(UPSERT_QUERY.contains("created_at = created_at ?? time::now()"));
    }

    #[test]
    fn test_upsert_key_is_composite() {
        assert!(
            UPSERT_QUERY
                .contains("type::thing('entity_memory', [$entity_type, $entity_id, $agent_key])")
        );
    }
}
