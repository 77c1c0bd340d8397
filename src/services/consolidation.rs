//! 整合引擎
//!
//! 按 (agent, session) 触发的后台任务：对足够陈旧、访问稀少的对话
//! 记忆做重要性衰减，并写入审计记录。重复运行会继续衰减，除 0 以外
//! 没有下限，不被使用的记忆随时间趋于无关。

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::config::ConsolidationConfig;
use crate::error::Result;
use crate::models::consolidation_repository::ConsolidationRepository;
use crate::models::entity_repository::EntityRepository;
use crate::models::memory::MemoryRecord;
use crate::models::memory_repository::MemoryRepository;

/// 候选记录的最小年龄（小时）
pub const CANDIDATE_STALE_HOURS: u32 = 24;

/// 候选记录的访问次数上限（access_count 严格小于该值）
pub const CANDIDATE_MAX_ACCESS: u64 = 2;

/// 单次获取的候选上限（最旧在前）
pub const CANDIDATE_FETCH_LIMIT: usize = 100;

/// 低于该数量不做整合，信号不足
pub const MIN_BATCH_SIZE: usize = 10;

/// 重要性低于该值才进入衰减子集
pub const DECAY_IMPORTANCE_CEILING: f64 = 0.3;

/// 每轮衰减系数
pub const DECAY_FACTOR: f64 = 0.8;

/// 单轮整合结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationOutcome {
    /// 取到的候选数量
    pub candidates: usize,
    /// 实际衰减的记录数量
    pub decayed: usize,
    /// 衰减的实体数量（entity_decay 开启时）
    pub entities_decayed: u64,
    /// 是否因候选不足而跳过
    pub skipped: bool,
}

/// 从候选集中挑出衰减子集
///
/// 候选不足 MIN_BATCH_SIZE 时返回 None（本轮跳过）；否则返回
/// 重要性低于阈值的记录 ID（可能为空，批次照常入审计）。
pub fn select_decay_candidates(records: &[MemoryRecord]) -> Option<Vec<i64>> {
    if records.len() < MIN_BATCH_SIZE {
        return None;
    }

    Some(
        records
            .iter()
            .filter(|r| r.importance_score < DECAY_IMPORTANCE_CEILING)
            .map(|r| r.id)
            .collect(),
    )
}

/// 整合引擎 trait
#[async_trait]
pub trait ConsolidationService: Send + Sync {
    /// 对一个 (agent, session) 范围跑一轮整合
    async fn consolidate(&self, agent_name: &str, session_id: &str)
    -> Result<ConsolidationOutcome>;
}

/// 整合引擎实现
pub struct ConsolidationServiceImpl {
    memory_repository: Arc<dyn MemoryRepository>,
    entity_repository: Arc<dyn EntityRepository>,
    consolidation_repository: Arc<dyn ConsolidationRepository>,
    config: ConsolidationConfig,
}

impl ConsolidationServiceImpl {
    pub fn new(
        memory_repository: Arc<dyn MemoryRepository>,
        entity_repository: Arc<dyn EntityRepository>,
        consolidation_repository: Arc<dyn ConsolidationRepository>,
        config: ConsolidationConfig,
    ) -> Self {
        Self {
            memory_repository,
            entity_repository,
            consolidation_repository,
            config,
        }
    }
}

#[async_trait]
impl ConsolidationService for ConsolidationServiceImpl {
    async fn consolidate(
        &self,
        agent_name: &str,
        session_id: &str,
    ) -> Result<ConsolidationOutcome> {
        let candidates = self
            .memory_repository
            .consolidation_candidates(
                agent_name,
                session_id,
                CANDIDATE_STALE_HOURS,
                CANDIDATE_MAX_ACCESS,
                CANDIDATE_FETCH_LIMIT,
            )
            .await?;

        let Some(decay_ids) = select_decay_candidates(&candidates) else {
            debug!(
                "consolidation skipped for {}/{}: only {} candidates",
                agent_name,
                session_id,
                candidates.len()
            );
            return Ok(ConsolidationOutcome {
                candidates: candidates.len(),
                skipped: true,
                ..Default::default()
            });
        };

        let result = HashMap::from([(
            "count".to_string(),
            serde_json::json!(decay_ids.len()),
        )]);

        self.consolidation_repository
            .record_decay_batch(agent_name, &decay_ids, DECAY_FACTOR, result)
            .await?;

        let entities_decayed = if self.config.entity_decay {
            self.entity_repository
                .decay_stale(
                    agent_name,
                    self.config.entity_stale_days,
                    DECAY_IMPORTANCE_CEILING,
                    DECAY_FACTOR,
                )
                .await?
        } else {
            0
        };

        info!(
            "consolidated {}/{}: {} candidates, {} decayed, {} entities decayed",
            agent_name,
            session_id,
            candidates.len(),
            decay_ids.len(),
            entities_decayed
        );

        Ok(ConsolidationOutcome {
            candidates: candidates.len(),
            decayed: decay_ids.len(),
            entities_decayed,
            skipped: false,
        })
    }
}

/// 创建整合引擎
pub fn create_consolidation_service(
    memory_repository: Arc<dyn MemoryRepository>,
    entity_repository: Arc<dyn EntityRepository>,
    consolidation_repository: Arc<dyn ConsolidationRepository>,
    config: ConsolidationConfig,
) -> Box<dyn ConsolidationService> {
    Box::new(ConsolidationServiceImpl::new(
        memory_repository,
        entity_repository,
        consolidation_repository,
        config,
    ))
}

/// 后台触发一轮整合；失败只记日志，不向任何调用方传播
pub fn spawn_consolidation(
    service: Arc<dyn ConsolidationService>,
    agent_name: String,
    session_id: String,
) {
    tokio::spawn(async move {
        if let Err(e) = service.consolidate(&agent_name, &session_id).await {
            warn!(
                "background consolidation for {}/{} failed: {}",
                agent_name, session_id, e
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::memory::{MemoryType, MessageRole};
    use chrono::Utc;

    fn record(id: i64, importance: f64) -> MemoryRecord {
        MemoryRecord {
            id,
            session_id: "session_1".into(),
            agent_name: "planner".into(),
            user_id: None,
            message_role: MessageRole::User,
            content: "old message".into(),
            metadata: None,
            importance_score: importance,
            memory_type: MemoryType::Episodic,
            created_at: Utc::now(),
            accessed_at: Utc::now(),
            access_count: 0,
        }
    }

    #[test]
    fn test_twelve_low_importance_candidates_all_selected() {
        let records: Vec<_> = (1..=12).map(|id| record(id, 0.2)).collect();
        let selected = select_decay_candidates(&records).unwrap();
        assert_eq!(selected.len(), 12);
        assert_eq!(selected, (1..=12).collect::<Vec<i64>>());
    }

    #[test]
    fn test_five_candidates_is_a_noop() {
        let records: Vec<_> = (1..=5).map(|id| record(id, 0.2)).collect();
        assert!(select_decay_candidates(&records).is_none());
    }

    #[test]
    fn test_only_low_importance_subset_decays() {
        let mut records: Vec<_> = (1..=10).map(|id| record(id, 0.2)).collect();
        records.push(record(11, 0.9));
        records.push(record(12, 0.3)); // 等于阈值不衰减

        let selected = select_decay_candidates(&records).unwrap();
        assert_eq!(selected.len(), 10);
        assert!(!selected.contains(&11));
        assert!(!selected.contains(&12));
    }

    #[test]
    fn test_decay_arithmetic() {
        assert!((0.2 * DECAY_FACTOR - 0.16).abs() < 1e-12);
        // 没有下限：重复衰减趋向 0
        let mut importance = 0.2;
        for _ in 0..100 {
            importance *= DECAY_FACTOR;
        }
        assert!(importance > 0.0 && importance < 1e-6);
    }
}
