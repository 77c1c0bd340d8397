//! 对话记忆仓储
//!
//! 提供对话记忆的持久化：追加写入、条件检索、子串搜索，以及
//! 整合/清理流程需要的批量操作。

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::memory::{MemoryFilter, MemoryRecord, NewMemoryRecord};
use crate::storage::surrealdb::SurrealPool;

/// 行投影：把记录键展开成自增 ID
const MEMORY_FIELDS: &str = "record::id(id) AS id, session_id, agent_name, user_id, \
     message_role, content, metadata, importance_score, memory_type, \
     created_at, accessed_at, access_count";

/// 追加写入：序列号分配与建行在同一条语句内完成
const APPEND_QUERY: &str = "
    CREATE type::thing('conversation_memory',
            (UPSERT counter:conversation_memory SET value = (value ?? 0) + 1 RETURN AFTER)[0].value)
        CONTENT {
            session_id: $session_id,
            agent_name: $agent_name,
            user_id: $user_id,
            message_role: $message_role,
            content: $content,
            metadata: $metadata,
            importance_score: $importance_score,
            memory_type: $memory_type,
            created_at: time::now(),
            accessed_at: time::now(),
            access_count: 0
        }
        RETURN record::id(id) AS id;
";

#[derive(Debug, Deserialize)]
struct IdRow {
    id: i64,
}

/// 对话记忆仓储 trait
#[async_trait]
pub trait MemoryRepository: Send + Sync {
    /// 追加一条对话记忆，返回新分配的序列 ID
    async fn append(&self, record: &NewMemoryRecord) -> Result<i64>;

    /// 条件检索（各条件合取，最新在前）
    ///
    /// 带会话条件时，先对整个会话做访问跟踪（access_count + 1、
    /// 刷新 accessed_at），这是读取的显式副作用。
    async fn query(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRecord>>;

    /// 子串搜索（不区分大小写），按重要性、再按时间倒序
    ///
    /// 占位实现：未来换成嵌入向量检索，不是真正的语义相似度。
    async fn semantic_search(
        &self,
        query: &str,
        agent_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>>;

    /// 选出整合候选：指定范围内足够陈旧、访问稀少的记录（最旧在前）
    async fn consolidation_candidates(
        &self,
        agent_name: &str,
        session_id: &str,
        older_than_hours: u32,
        max_access_count: u64,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>>;

    /// 归档清除：删除超龄、低重要性且从未被访问的记录，返回删除数
    async fn archive_stale(
        &self,
        archive_after_days: u32,
        importance_ceiling: f64,
    ) -> Result<u64>;
}

/// 对话记忆仓储实现
#[derive(Clone)]
pub struct MemoryRepositoryImpl {
    pool: SurrealPool,
}

impl MemoryRepositoryImpl {
    pub fn new(pool: SurrealPool) -> Self {
        Self { pool }
    }
}

/// 组装检索语句；会话条件存在时在 SELECT 之前插入访问跟踪 UPDATE。
/// 返回 (语句, SELECT 结果所在的语句下标)。
fn build_query_statements(filter: &MemoryFilter) -> (String, usize) {
    let mut conditions: Vec<&str> = Vec::new();
    if filter.agent_name.is_some() {
        conditions.push("agent_name = $agent_name");
    }
    if filter.session_id.is_some() {
        conditions.push("session_id = $session_id");
    }
    if filter.user_id.is_some() {
        conditions.push("user_id = $user_id");
    }
    if filter.min_importance > 0.0 {
        conditions.push("importance_score >= $min_importance");
    }
    if filter.time_range_hours.is_some() {
        conditions.push("created_at > time::now() - duration::from::hours($time_range_hours)");
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {} ", conditions.join(" AND "))
    };

    let select = format!(
        "SELECT {} FROM conversation_memory {}ORDER BY created_at DESC LIMIT $limit;",
        MEMORY_FIELDS, where_clause
    );

    if filter.session_id.is_some() {
        let touch = "UPDATE conversation_memory \
             SET access_count += 1, accessed_at = time::now() \
             WHERE session_id = $session_id RETURN NONE;";
        (format!("{}\n{}", touch, select), 1)
    } else {
        (select, 0)
    }
}

#[async_trait]
impl MemoryRepository for MemoryRepositoryImpl {
    async fn append(&self, record: &NewMemoryRecord) -> Result<i64> {
        let db = self.pool.inner().await;
        let record = record.clone();

        self.pool
            .run("memory.append", async move {
                let mut response = db
                    .query(APPEND_QUERY)
                    .bind(("session_id", record.session_id))
                    .bind(("agent_name", record.agent_name))
                    .bind(("user_id", record.user_id))
                    .bind(("message_role", record.message_role.to_string()))
                    .bind(("content", record.content))
                    .bind(("metadata", record.metadata))
                    .bind(("importance_score", record.importance_score))
                    .bind(("memory_type", record.memory_type.to_string()))
                    .await?;

                let created: Option<IdRow> = response.take(0)?;
                created
                    .map(|row| row.id)
                    .ok_or_else(|| AppError::Database("append returned no id".to_string()))
            })
            .await
    }

    async fn query(&self, filter: &MemoryFilter) -> Result<Vec<MemoryRecord>> {
        let db = self.pool.inner().await;
        let filter = filter.clone();
        let (sql, select_slot) = build_query_statements(&filter);

        self.pool
            .run("memory.query", async move {
                let mut response = db
                    .query(sql)
                    .bind(("agent_name", filter.agent_name))
                    .bind(("session_id", filter.session_id))
                    .bind(("user_id", filter.user_id))
                    .bind(("min_importance", filter.min_importance))
                    .bind(("time_range_hours", filter.time_range_hours))
                    .bind(("limit", filter.limit as i64))
                    .await?;

                let rows: Vec<MemoryRecord> = response.take(select_slot)?;
                Ok(rows)
            })
            .await
    }

    async fn semantic_search(
        &self,
        query: &str,
        agent_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>> {
        let db = self.pool.inner().await;
        let query = query.to_string();
        let agent_name = agent_name.map(|s| s.to_string());

        let mut conditions =
            vec!["string::contains(string::lowercase(content), string::lowercase($query))"];
        if agent_name.is_some() {
            conditions.push("agent_name = $agent_name");
        }

        let sql = format!(
            "SELECT {} FROM conversation_memory WHERE {} \
             ORDER BY importance_score DESC, created_at DESC LIMIT $limit;",
            MEMORY_FIELDS,
            conditions.join(" AND ")
        );

        self.pool
            .run("memory.semantic_search", async move {
                let mut response = db
                    .query(sql)
                    .bind(("query", query))
                    .bind(("agent_name", agent_name))
                    .bind(("limit", limit as i64))
                    .await?;

                let rows: Vec<MemoryRecord> = response.take(0)?;
                Ok(rows)
            })
            .await
    }

    async fn consolidation_candidates(
        &self,
        agent_name: &str,
        session_id: &str,
        older_than_hours: u32,
        max_access_count: u64,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>> {
        let db = self.pool.inner().await;
        let agent_name = agent_name.to_string();
        let session_id = session_id.to_string();

        let sql = format!(
            "SELECT {} FROM conversation_memory \
             WHERE agent_name = $agent_name AND session_id = $session_id \
               AND created_at < time::now() - duration::from::hours($older_than_hours) \
               AND access_count < $max_access_count \
             ORDER BY created_at ASC LIMIT $limit;",
            MEMORY_FIELDS
        );

        self.pool
            .run("memory.consolidation_candidates", async move {
                let mut response = db
                    .query(sql)
                    .bind(("agent_name", agent_name))
                    .bind(("session_id", session_id))
                    .bind(("older_than_hours", older_than_hours))
                    .bind(("max_access_count", max_access_count))
                    .bind(("limit", limit as i64))
                    .await?;

                let rows: Vec<MemoryRecord> = response.take(0)?;
                Ok(rows)
            })
            .await
    }

    async fn archive_stale(
        &self,
        archive_after_days: u32,
        importance_ceiling: f64,
    ) -> Result<u64> {
        let db = self.pool.inner().await;

        let sql = "DELETE conversation_memory \
             WHERE created_at < time::now() - duration::from::days($archive_after_days) \
               AND importance_score < $importance_ceiling \
               AND access_count = 0 \
             RETURN record::id(id) AS id;";

        self.pool
            .run("memory.archive_stale", async move {
                let mut response = db
                    .query(sql)
                    .bind(("archive_after_days", archive_after_days))
                    .bind(("importance_ceiling", importance_ceiling))
                    .await?;

                let removed: Vec<IdRow> = response.take(0)?;
                Ok(removed.len() as u64)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::memory::MemoryFilter;

    #[test]
    fn test_build_query_without_filters() {
        let (sql, slot) = build_query_statements(&MemoryFilter::new());
        assert_eq!(slot, 0);
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("UPDATE"));
        assert!(sql.contains("ORDER BY created_at DESC"));
    }

    #[test]
    fn test_build_query_with_session_touches_first() {
        let (sql, slot) = build_query_statements(&MemoryFilter::new().for_session("s1"));
        assert_eq!(slot, 1);

        // 访问跟踪必须先于 SELECT 执行
        let touch = sql.find("UPDATE conversation_memory").unwrap();
        let select = sql.find("SELECT").unwrap();
        assert!(touch < select);
        assert!(sql.contains("access_count += 1"));
        assert!(sql.contains("accessed_at = time::now()"));
    }

    #[test]
    fn test_build_query_conjunctive_filters() {
        let filter = MemoryFilter::new()
            .for_agent("planner")
            .with_min_importance(0.3)
            .within_hours(24);
        let (sql, slot) = build_query_statements(&filter);
        assert_eq!(slot, 0);
        assert!(sql.contains("agent_name = $agent_name"));
        assert!(sql.contains("importance_score >= $min_importance"));
        assert!(sql.contains("duration::from::hours($time_range_hours)"));
        assert!(!sql.contains("session_id = $session_id"));
    }

    #[test]
    fn test_zero_min_importance_not_filtered() {
        let (sql, _) = build_query_statements(&MemoryFilter::new().for_agent("planner"));
        assert!(!sql.contains("min_importance"));
    }
}
