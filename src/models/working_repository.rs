//! 工作记忆仓储
//!
//! 复合键 (agent, session, context_type) 构成记录 ID；合并写入在
//! 基座侧单语句完成，过期过滤在读取语句内完成。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::sql::Datetime;

use crate::error::Result;
use crate::models::working::{WorkingContext, WorkingUpsert};
use crate::storage::surrealdb::SurrealPool;

const WORKING_FIELDS: &str =
    "agent_name, session_id, context_type, context_data, ttl_seconds, created_at, expires_at";

/// 插入或合并：上下文数据做浅层并集（新键覆盖旧键、嵌套值整体替换），
/// 过期时间从"现在"重新前移。
const UPSERT_QUERY: &str = "
    UPSERT type::thing('working_memory', [$agent_name, $session_id, $context_type]) SET
        agent_name = $agent_name,
        session_id = $session_id,
        context_type = $context_type,
        context_data = object::from_entries(array::concat(
            object::entries(context_data ?? {}),
            object::entries($context_data)
        )),
        ttl_seconds = $ttl_seconds,
        created_at = time::now(),
        expires_at = $expires_at
    RETURN NONE;
";

#[derive(Debug, Deserialize)]
struct SessionRow {
    #[allow(dead_code)]
    session_id: String,
}

/// 工作记忆仓储 trait
#[async_trait]
pub trait WorkingMemoryRepository: Send + Sync {
    /// 插入或合并一条工作记忆，返回新的过期时间
    async fn upsert(&self, upsert: &WorkingUpsert) -> Result<DateTime<Utc>>;

    /// 读取单个未过期记录
    async fn get_one(
        &self,
        agent_name: &str,
        session_id: &str,
        context_type: &str,
    ) -> Result<Option<WorkingContext>>;

    /// 读取 (agent, session) 下所有未过期记录
    async fn get_all(&self, agent_name: &str, session_id: &str) -> Result<Vec<WorkingContext>>;

    /// 无条件清空 (agent, session) 下所有记录，过期与否都删
    async fn clear(&self, agent_name: &str, session_id: &str) -> Result<()>;

    /// 清理已过期记录，返回删除数
    async fn sweep_expired(&self) -> Result<u64>;
}

/// 工作记忆仓储实现
#[derive(Clone)]
pub struct WorkingMemoryRepositoryImpl {
    pool: SurrealPool,
}

impl WorkingMemoryRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkingMemoryRepository for WorkingMemoryRepositoryImpl {
    async fn upsert(&self, upsert: &WorkingUpsert) -> Result<DateTime<Utc>> {
        let db = self.pool.inner().await;
        let upsert = upsert.clone();
        let expires_at = upsert.expiry_from(Utc::now());

        self.pool
            .run("working.upsert", async move {
                db.query(UPSERT_QUERY)
                    .bind(("agent_name", upsert.agent_name))
                    .bind(("session_id", upsert.session_id))
                    .bind(("context_type", upsert.context_type))
                    .bind(("context_data", upsert.context_data))
                    .bind(("ttl_seconds", upsert.ttl_seconds))
                    .bind(("expires_at", Datetime::from(expires_at)))
                    .await?
                    .check()?;
                Ok(expires_at)
            })
            .await
    }

    async fn get_one(
        &self,
        agent_name: &str,
        session_id: &str,
        context_type: &str,
    ) -> Result<Option<WorkingContext>> {
        let db = self.pool.inner().await;
        let agent_name = agent_name.to_string();
        let session_id = session_id.to_string();
        let context_type = context_type.to_string();

        let sql = format!(
            "SELECT {} FROM type::thing('working_memory', [$agent_name, $session_id, $context_type]) \
             WHERE expires_at > time::now();",
            WORKING_FIELDS
        );

        self.pool
            .run("working.get_one", async move {
                let mut response = db
                    .query(sql)
                    .bind(("agent_name", agent_name))
                    .bind(("session_id", session_id))
                    .bind(("context_type", context_type))
                    .await?;

                let rows: Vec<WorkingContext> = response.take(0)?;
                Ok(rows.into_iter().next())
            })
            .await
    }

    async fn get_all(&self, agent_name: &str, session_id: &str) -> Result<Vec<WorkingContext>> {
        let db = self.pool.inner().await;
        let agent_name = agent_name.to_string();
        let session_id = session_id.to_string();

        let sql = format!(
            "SELECT {} FROM working_memory \
             WHERE agent_name = $agent_name AND session_id = $session_id \
               AND expires_at > time::now();",
            WORKING_FIELDS
        );

        self.pool
            .run("working.get_all", async move {
                let mut response = db
                    .query(sql)
                    .bind(("agent_name", agent_name))
                    .bind(("session_id", session_id))
                    .await?;

                let rows: Vec<WorkingContext> = response.take(0)?;
                Ok(rows)
            })
            .await
    }

    async fn clear(&self, agent_name: &str, session_id: &str) -> Result<()> {
        let db = self.pool.inner().await;
        let agent_name = agent_name.to_string();
        let session_id = session_id.to_string();

        let sql = "DELETE working_memory \
             WHERE agent_name = $agent_name AND session_id = $session_id \
             RETURN NONE;";

        self.pool
            .run("working.clear", async move {
                db.query(sql)
                    .bind(("agent_name", agent_name))
                    .bind(("session_id", session_id))
                    .await?
                    .check()?;
                Ok(())
            })
            .await
    }

    async fn sweep_expired(&self) -> Result<u64> {
        let db = self.pool.inner().await;

        let sql = "DELETE working_memory WHERE expires_at < time::now() RETURN session_id;";

        self.pool
            .run("working.sweep_expired", async move {
                let mut response = db.query(sql).await?;
                let removed: Vec<SessionRow> = response.take(0)?;
                Ok(removed.len() as u64)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_query_merge_semantics() {
        let old = UPSERT_QUERY.find("object::entries(context_data ?? {})").unwrap();
        let new = UPSERT_QUERY.find("object::entries($context_data)").unwrap();
        assert!(old < new, "new keys must win the shallow union");
        assert!(UPSERT_QUERY.contains("expires_at = $expires_at"));
        assert!(UPSERT_QUERY.contains("created_at = time::now()"));
    }

    #[test]
    fn test_upsert_key_is_composite() {
        assert!(
            UPSERT_QUERY
                .contains("type::thing('working_memory', [$agent_name, $session_id, $context_type])")
        );
    }
}
