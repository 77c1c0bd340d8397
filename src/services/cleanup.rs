//! 清理流程
//!
//! 两个相互独立、幂等的清理：删除已过期的工作记忆；归档清除超龄、
//! 低重要性且从未被访问的对话记忆。只按时间点谓词删行，可与正常
//! 流量并发执行。调度由外部负责（cron 等），这里只暴露单次执行。

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::models::memory_repository::MemoryRepository;
use crate::models::working_repository::WorkingMemoryRepository;

/// 对话记忆归档年龄（天）
pub const ARCHIVE_AFTER_DAYS: u32 = 90;

/// 归档的重要性上限（严格小于）
pub const ARCHIVE_IMPORTANCE_CEILING: f64 = 0.2;

/// 单轮清理结果
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// 删除的过期工作记忆条数
    pub expired_working_removed: u64,
    /// 归档清除的对话记忆条数
    pub conversations_archived: u64,
}

/// 清理流程 trait
#[async_trait]
pub trait CleanupService: Send + Sync {
    /// 跑一轮清理，返回删除计数
    async fn run(&self) -> Result<CleanupReport>;
}

/// 清理流程实现
pub struct CleanupServiceImpl {
    working_repository: Arc<dyn WorkingMemoryRepository>,
    memory_repository: Arc<dyn MemoryRepository>,
}

impl CleanupServiceImpl {
    pub fn new(
        working_repository: Arc<dyn WorkingMemoryRepository>,
        memory_repository: Arc<dyn MemoryRepository>,
    ) -> Self {
        Self {
            working_repository,
            memory_repository,
        }
    }
}

#[async_trait]
impl CleanupService for CleanupServiceImpl {
    async fn run(&self) -> Result<CleanupReport> {
        let expired_working_removed = self.working_repository.sweep_expired().await?;

        let conversations_archived = self
            .memory_repository
            .archive_stale(ARCHIVE_AFTER_DAYS, ARCHIVE_IMPORTANCE_CEILING)
            .await?;

        info!(
            "cleanup removed {} expired working contexts, archived {} conversations",
            expired_working_removed, conversations_archived
        );

        Ok(CleanupReport {
            expired_working_removed,
            conversations_archived,
        })
    }
}

/// 创建清理流程
pub fn create_cleanup_service(
    working_repository: Arc<dyn WorkingMemoryRepository>,
    memory_repository: Arc<dyn MemoryRepository>,
) -> Box<dyn CleanupService> {
    Box::new(CleanupServiceImpl::new(working_repository, memory_repository))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_counts() {
        let report = CleanupReport {
            expired_working_removed: 3,
            conversations_archived: 7,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["expired_working_removed"], 3);
        assert_eq!(json["conversations_archived"], 7);
    }
}
