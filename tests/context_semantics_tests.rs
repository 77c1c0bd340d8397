// Cross-module tests for the context-store semantics that do not need a
// live substrate: boundary validation, TTL/expiry maths, the recent-list
// mirror contract and the consolidation thresholds.

use std::collections::HashMap;

use chrono::{Duration, Utc};

use mnemo::models::entity::EntityUpsert;
use mnemo::models::memory::{
    DEFAULT_IMPORTANCE, DEFAULT_QUERY_LIMIT, MemoryRecord, MemoryType, MessageRole,
    NewMemoryRecord, validate_importance,
};
use mnemo::models::working::{DEFAULT_WORKING_TTL_SECS, WorkingContext, WorkingUpsert};
use mnemo::services::cleanup::{ARCHIVE_AFTER_DAYS, ARCHIVE_IMPORTANCE_CEILING};
use mnemo::services::consolidation::{
    DECAY_FACTOR, DECAY_IMPORTANCE_CEILING, MIN_BATCH_SIZE, select_decay_candidates,
};
use mnemo::storage::cache::{
    CacheStore, RECENT_CONTENT_MAX_CHARS, RECENT_LIST_MAX, RecentEntry, truncate_content,
};

fn conversation(id: i64, importance: f64) -> MemoryRecord {
    MemoryRecord {
        id,
        session_id: "session_1".into(),
        agent_name: "planner".into(),
        user_id: Some("u-42".into()),
        message_role: MessageRole::Assistant,
        content: "deploy finished".into(),
        metadata: None,
        importance_score: importance,
        memory_type: MemoryType::Episodic,
        created_at: Utc::now() - Duration::days(2),
        accessed_at: Utc::now() - Duration::days(2),
        access_count: 0,
    }
}

#[test]
fn importance_is_rejected_at_the_boundary_not_clamped() {
    assert!(validate_importance(0.0).is_ok());
    assert!(validate_importance(1.0).is_ok());
    assert!(validate_importance(1.0001).is_err());
    assert!(validate_importance(-0.0001).is_err());

    let record = NewMemoryRecord {
        session_id: "session_1".into(),
        agent_name: "planner".into(),
        user_id: None,
        message_role: MessageRole::User,
        content: "hello".into(),
        metadata: None,
        importance_score: 1.5,
        memory_type: MemoryType::Episodic,
    };
    assert!(record.validate().is_err());
}

#[test]
fn working_memory_ttl_boundary() {
    let now = Utc::now();
    let upsert = WorkingUpsert {
        agent_name: "planner".into(),
        session_id: "session_1".into(),
        context_type: "current_task".into(),
        context_data: HashMap::from([("step".to_string(), serde_json::json!(1))]),
        ttl_seconds: 1,
    };

    // 写入后立即可读
    let context = WorkingContext {
        agent_name: upsert.agent_name.clone(),
        session_id: upsert.session_id.clone(),
        context_type: upsert.context_type.clone(),
        context_data: upsert.context_data.clone(),
        ttl_seconds: upsert.ttl_seconds,
        created_at: now,
        expires_at: upsert.expiry_from(now),
    };
    assert!(!context.is_expired());

    // 过了 TTL 之后不可读
    let stale = WorkingContext {
        expires_at: now - Duration::seconds(2),
        ..context
    };
    assert!(stale.is_expired());

    assert_eq!(DEFAULT_WORKING_TTL_SECS, 3600);
}

#[test]
fn repeated_upserts_keep_moving_expiry_forward() {
    let upsert = WorkingUpsert {
        agent_name: "planner".into(),
        session_id: "session_1".into(),
        context_type: "current_task".into(),
        context_data: HashMap::new(),
        ttl_seconds: 60,
    };

    let first = upsert.expiry_from(Utc::now());
    let second = upsert.expiry_from(Utc::now() + Duration::seconds(30));
    assert!(second > first);
}

#[test]
fn consolidation_decays_a_full_batch_and_skips_small_ones() {
    // 12 条旧记录、重要性 0.2：全部进入衰减子集
    let records: Vec<_> = (1..=12).map(|id| conversation(id, 0.2)).collect();
    let batch = select_decay_candidates(&records).expect("12 candidates form a batch");
    assert_eq!(batch.len(), 12);
    for record in &records {
        let decayed = record.importance_score * DECAY_FACTOR;
        assert!((decayed - 0.16).abs() < 1e-12);
    }

    // 只有 5 条时不做任何事
    let few: Vec<_> = (1..=5).map(|id| conversation(id, 0.2)).collect();
    assert!(select_decay_candidates(&few).is_none());
    assert!(few.len() < MIN_BATCH_SIZE);
}

#[test]
fn consolidation_leaves_important_records_alone() {
    let mut records: Vec<_> = (1..=11).map(|id| conversation(id, 0.1)).collect();
    records.push(conversation(12, 0.8));

    let batch = select_decay_candidates(&records).unwrap();
    assert_eq!(batch.len(), 11);
    assert!(!batch.contains(&12));
    assert!(0.8 >= DECAY_IMPORTANCE_CEILING);
}

#[test]
fn recent_mirror_contract() {
    // 键空间与原始布局一致
    assert_eq!(
        CacheStore::recent_key("planner", "session_1"),
        "memory:recent:planner:session_1"
    );

    // 内容按字符截断到 200，多字节安全
    let content = "Nguyễn Văn A đã cập nhật hồ sơ. ".repeat(20);
    let entry = RecentEntry::from_stored(9, MessageRole::User, &content);
    assert_eq!(entry.content.chars().count(), RECENT_CONTENT_MAX_CHARS);
    assert!(content.starts_with(&entry.content));
    assert_eq!(entry.role, "user");

    // 镜像最多保留 50 条
    assert_eq!(RECENT_LIST_MAX, 50);
    assert!(truncate_content("short", RECENT_CONTENT_MAX_CHARS).len() == 5);
}

#[test]
fn entity_scenario_payloads_validate() {
    let first = EntityUpsert {
        entity_type: "person".into(),
        entity_id: "nguyen_van_a".into(),
        entity_name: "Nguyễn Văn A".into(),
        attributes: HashMap::from([("dept".to_string(), serde_json::json!("eng"))]),
        relationships: None,
        agent_name: None,
        importance: DEFAULT_IMPORTANCE,
    };
    let second = EntityUpsert {
        attributes: HashMap::from([(
            "jira_username".to_string(),
            serde_json::json!("nguyenvana"),
        )]),
        ..first.clone()
    };

    assert!(first.validate().is_ok());
    assert!(second.validate().is_ok());
    // 全局实体在复合键里用空串占位
    assert_eq!(first.agent_key(), "");
}

#[test]
fn cleanup_predicate_constants() {
    assert_eq!(ARCHIVE_AFTER_DAYS, 90);
    assert!((ARCHIVE_IMPORTANCE_CEILING - 0.2).abs() < f64::EPSILON);
    assert_eq!(DEFAULT_QUERY_LIMIT, 50);
}
