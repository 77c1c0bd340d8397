use crate::config::config::DatabaseConfig;
use crate::error::{AppError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::{
    Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tokio::sync::Mutex;

/// 建表与索引语句（幂等）
const SCHEMA_STATEMENTS: &str = "
    DEFINE TABLE IF NOT EXISTS conversation_memory SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS idx_conversation_session ON TABLE conversation_memory COLUMNS session_id, created_at;
    DEFINE INDEX IF NOT EXISTS idx_conversation_agent ON TABLE conversation_memory COLUMNS agent_name, created_at;
    DEFINE TABLE IF NOT EXISTS entity_memory SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS idx_entity_type ON TABLE entity_memory COLUMNS entity_type, entity_id;
    DEFINE TABLE IF NOT EXISTS working_memory SCHEMALESS;
    DEFINE INDEX IF NOT EXISTS idx_working_expires ON TABLE working_memory COLUMNS expires_at;
    DEFINE TABLE IF NOT EXISTS memory_consolidation SCHEMALESS;
";

/// SurrealDB 连接池
#[derive(Clone)]
pub struct SurrealPool {
    /// 数据库连接
    db: Arc<Mutex<Option<Surreal<Any>>>>,
    /// 连接配置
    config: DatabaseConfig,
}

impl SurrealPool {
    /// 创建新的连接池
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let db: Surreal<Any> = connect(&config.url).await?;

        // 认证
        db.signin(Root {
            username: &config.username,
            password: &config.password,
        })
        .await?;

        // 选择命名空间和数据库
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Ok(Self {
            db: Arc::new(Mutex::new(Some(db))),
            config,
        })
    }

    /// 获取内部数据库实例
    pub async fn inner(&self) -> Surreal<Any> {
        let guard = self.db.lock().await;
        guard.as_ref().expect("Database connection closed").clone()
    }

    /// 单次查询超时上限
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.config.query_timeout)
    }

    /// 为一次持久层调用加上超时上限
    ///
    /// 超时与连接失败直接上抛给调用方，不做自动重试。
    pub async fn run<T>(&self, op: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.query_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} exceeded {}s",
                op, self.config.query_timeout
            ))),
        }
    }

    /// 初始化表与索引
    pub async fn init_schema(&self) -> Result<()> {
        let db = self.inner().await;
        db.query(SCHEMA_STATEMENTS).await?.check()?;
        Ok(())
    }

    /// 关闭连接
    pub async fn close(&self) {
        let mut guard = self.db.lock().await;
        *guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_covers_all_tables() {
        for table in [
            "conversation_memory",
            "entity_memory",
            "working_memory",
            "memory_consolidation",
        ] {
            assert!(
                SCHEMA_STATEMENTS.contains(&format!("DEFINE TABLE IF NOT EXISTS {}", table)),
                "missing table definition: {}",
                table
            );
        }
        assert!(SCHEMA_STATEMENTS.contains("idx_working_expires"));
    }
}
