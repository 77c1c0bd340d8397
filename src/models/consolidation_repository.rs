//! 整合审计仓储
//!
//! 衰减与审计记录必须一起生效：两条语句放进同一个事务，
//! 衰减失败时审计不会落库。

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::models::consolidation::CONSOLIDATION_REDUCE_IMPORTANCE;
use crate::storage::surrealdb::SurrealPool;

const DECAY_BATCH_QUERY: &str = "
    BEGIN TRANSACTION;
    UPDATE conversation_memory
        SET importance_score = importance_score * $decay_factor
        WHERE record::id(id) IN $source_ids
        RETURN NONE;
    CREATE memory_consolidation CONTENT {
        agent_name: $agent_name,
        consolidation_type: $consolidation_type,
        source_ids: $source_ids,
        result: $result,
        created_at: time::now()
    } RETURN NONE;
    COMMIT TRANSACTION;
";

/// 整合审计仓储 trait
#[async_trait]
pub trait ConsolidationRepository: Send + Sync {
    /// 应用一批重要性衰减并写入一条审计记录（原子）
    async fn record_decay_batch(
        &self,
        agent_name: &str,
        source_ids: &[i64],
        decay_factor: f64,
        result: HashMap<String, serde_json::Value>,
    ) -> Result<()>;
}

/// 整合审计仓储实现
#[derive(Clone)]
pub struct ConsolidationRepositoryImpl {
    pool: SurrealPool,
}

impl ConsolidationRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConsolidationRepository for ConsolidationRepositoryImpl {
    async fn record_decay_batch(
        &self,
        agent_name: &str,
        source_ids: &[i64],
        decay_factor: f64,
        result: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        let db = self.pool.inner().await;
        let agent_name = agent_name.to_string();
        let source_ids = source_ids.to_vec();

        self.pool
            .run("consolidation.record_decay_batch", async move {
                db.query(DECAY_BATCH_QUERY)
                    .bind(("agent_name", agent_name))
                    .bind(("consolidation_type", CONSOLIDATION_REDUCE_IMPORTANCE))
                    .bind(("source_ids", source_ids))
                    .bind(("decay_factor", decay_factor))
                    .bind(("result", result))
                    .await?
                    .check()?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_and_log_share_one_transaction() {
        let begin = DECAY_BATCH_QUERY.find("BEGIN TRANSACTION").unwrap();
        let update = DECAY_BATCH_QUERY.find("UPDATE conversation_memory").unwrap();
        let create = DECAY_BATCH_QUERY.find("CREATE memory_consolidation").unwrap();
        let commit = DECAY_BATCH_QUERY.find("COMMIT TRANSACTION").unwrap();
        assert!(begin < update && update < create && create < commit);
    }
}
