//! 短期记忆缓存层（Redis）
//!
//! 两种用途：
//! 1. 短期键值存储 —— 带 TTL 的会话级临时数据；
//! 2. 最近对话镜像 —— 每次持久写入后推送截断副本，加速"最近 N 轮"读取。
//!
//! 缓存永远不持有规范数据：丢失可容忍。除短期写入外，所有操作降级为
//! 未命中/空结果，错误只记日志，绝不影响持久写入路径。

use chrono::{DateTime, Utc};
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::config::CacheConfig;
use crate::error::{AppError, Result};
use crate::models::memory::MessageRole;

/// 短期键值默认 TTL：30 分钟
pub const DEFAULT_SHORT_TERM_TTL_SECS: u64 = 1800;

/// 最近对话镜像保留条数
pub const RECENT_LIST_MAX: usize = 50;

/// 最近对话镜像 TTL：24 小时
pub const RECENT_TTL_SECS: i64 = 86_400;

/// 镜像内容截断长度（字符）
pub const RECENT_CONTENT_MAX_CHARS: usize = 200;

/// 按字符边界截断内容，多字节文本安全
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}

/// 短期键值的存储信封
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortTermEnvelope {
    /// 调用方数据
    pub data: HashMap<String, serde_json::Value>,
    /// 写入时间
    pub stored_at: DateTime<Utc>,
    /// 所属 Agent
    pub agent: String,
}

/// 最近对话镜像条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentEntry {
    /// 持久层记录 ID
    pub id: i64,
    /// 消息角色
    pub role: String,
    /// 截断后的内容
    pub content: String,
    /// 写入时间
    pub timestamp: DateTime<Utc>,
}

impl RecentEntry {
    /// 由一次持久写入构造镜像条目
    pub fn from_stored(id: i64, role: MessageRole, content: &str) -> Self {
        Self {
            id,
            role: role.to_string(),
            content: truncate_content(content, RECENT_CONTENT_MAX_CHARS),
            timestamp: Utc::now(),
        }
    }
}

/// 缓存层句柄
///
/// 启动时建立连接；Redis 不可达时以禁用态运行，服务照常启动。
#[derive(Clone)]
pub struct CacheStore {
    conn: Option<ConnectionManager>,
    op_timeout: Duration,
}

impl CacheStore {
    /// 连接缓存层（尽力而为，失败不阻止启动）
    pub async fn connect(config: &CacheConfig) -> Self {
        let op_timeout = Duration::from_millis(config.op_timeout_ms);

        let conn = match Self::try_connect(&config.url, op_timeout).await {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!("cache unavailable, short-term tier degraded: {}", e);
                None
            }
        };

        Self { conn, op_timeout }
    }

    async fn try_connect(url: &str, timeout: Duration) -> Result<ConnectionManager> {
        let client = redis::Client::open(url)?;
        match tokio::time::timeout(timeout, ConnectionManager::new(client)).await {
            Ok(conn) => Ok(conn?),
            Err(_) => Err(AppError::Timeout("cache connect".to_string())),
        }
    }

    /// 缓存层是否可用
    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    /// 短期键值的缓存键
    pub fn short_term_key(agent_name: &str, session_id: &str, key: &str) -> String {
        format!("memory:short:{}:{}:{}", agent_name, session_id, key)
    }

    /// 短期键值的会话级扫描模式
    pub fn short_term_pattern(agent_name: &str, session_id: &str) -> String {
        format!("memory:short:{}:{}:*", agent_name, session_id)
    }

    /// 最近对话镜像的缓存键
    pub fn recent_key(agent_name: &str, session_id: &str) -> String {
        format!("memory:recent:{}:{}", agent_name, session_id)
    }

    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} exceeded {}ms",
                op,
                self.op_timeout.as_millis()
            ))),
        }
    }

    /// 写入短期键值
    ///
    /// 短期层没有持久兜底，缓存不可用时错误上抛而不是吞掉。
    pub async fn put_short_term(
        &self,
        agent_name: &str,
        session_id: &str,
        key: &str,
        envelope: &ShortTermEnvelope,
        ttl_seconds: u64,
    ) -> Result<String> {
        let Some(mut conn) = self.conn.clone() else {
            return Err(AppError::Connection("cache unavailable".to_string()));
        };

        let cache_key = Self::short_term_key(agent_name, session_id, key);
        let payload = serde_json::to_string(envelope)?;

        self.bounded("cache.put_short_term", async {
            conn.set_ex::<_, _, ()>(&cache_key, payload, ttl_seconds)
                .await?;
            Ok(())
        })
        .await?;

        Ok(cache_key)
    }

    /// 读取短期键值；不可用/出错一律视为未命中
    pub async fn get_short_term(
        &self,
        agent_name: &str,
        session_id: &str,
        key: &str,
    ) -> Option<ShortTermEnvelope> {
        let Some(mut conn) = self.conn.clone() else {
            return None;
        };

        let cache_key = Self::short_term_key(agent_name, session_id, key);
        let result = self
            .bounded("cache.get_short_term", async {
                let raw: Option<String> = conn.get(&cache_key).await?;
                Ok(raw)
            })
            .await;

        match result {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(envelope) => Some(envelope),
                Err(e) => {
                    warn!("discarding undecodable cache entry {}: {}", cache_key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("cache read degraded to miss: {}", e);
                None
            }
        }
    }

    /// 列出会话下的短期键（去掉键前缀）；出错返回空
    pub async fn list_short_term_keys(&self, agent_name: &str, session_id: &str) -> Vec<String> {
        let Some(mut conn) = self.conn.clone() else {
            return Vec::new();
        };

        let pattern = Self::short_term_pattern(agent_name, session_id);
        let result = self
            .bounded("cache.list_short_term", async {
                let mut keys = Vec::new();
                let mut iter: redis::AsyncIter<String> = conn.scan_match(&pattern).await?;
                while let Some(cache_key) = iter.next_item().await {
                    let suffix = cache_key.rsplit(':').next().unwrap_or_default();
                    keys.push(suffix.to_string());
                }
                Ok(keys)
            })
            .await;

        match result {
            Ok(keys) => keys,
            Err(e) => {
                warn!("cache scan degraded to empty: {}", e);
                Vec::new()
            }
        }
    }

    /// 推送最近对话镜像条目（持久写入的副作用，错误一律吞掉）
    pub async fn push_recent(&self, agent_name: &str, session_id: &str, entry: &RecentEntry) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };

        let key = Self::recent_key(agent_name, session_id);
        let payload = match serde_json::to_string(entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("recent-list entry not serializable: {}", e);
                return;
            }
        };

        let outcome = self
            .bounded("cache.push_recent", async {
                conn.lpush::<_, _, ()>(&key, payload).await?;
                conn.ltrim::<_, ()>(&key, 0, RECENT_LIST_MAX as isize - 1)
                    .await?;
                conn.expire::<_, ()>(&key, RECENT_TTL_SECS).await?;
                Ok(())
            })
            .await;

        if let Err(e) = outcome {
            warn!("recent-list mirror push skipped: {}", e);
        }
    }

    /// 读取最近对话镜像；未命中/出错返回 None，调用方回落到持久层
    pub async fn recent(
        &self,
        agent_name: &str,
        session_id: &str,
        limit: usize,
    ) -> Option<Vec<RecentEntry>> {
        let Some(mut conn) = self.conn.clone() else {
            return None;
        };

        let key = Self::recent_key(agent_name, session_id);
        let result = self
            .bounded("cache.recent", async {
                let stop = limit.saturating_sub(1) as isize;
                let raw: Vec<String> = conn.lrange(&key, 0, stop).await?;
                Ok(raw)
            })
            .await;

        match result {
            Ok(raw) if raw.is_empty() => None,
            Ok(raw) => {
                let entries: Vec<RecentEntry> = raw
                    .iter()
                    .filter_map(|item| serde_json::from_str(item).ok())
                    .collect();
                if entries.is_empty() { None } else { Some(entries) }
            }
            Err(e) => {
                warn!("recent-list read degraded to miss: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_scheme() {
        assert_eq!(
            CacheStore::short_term_key("planner", "session_1", "scratch"),
            "memory:short:planner:session_1:scratch"
        );
        assert_eq!(
            CacheStore::short_term_pattern("planner", "session_1"),
            "memory:short:planner:session_1:*"
        );
        assert_eq!(
            CacheStore::recent_key("planner", "session_1"),
            "memory:recent:planner:session_1"
        );
    }

    #[test]
    fn test_truncate_content_char_boundary_safe() {
        assert_eq!(truncate_content("hello", 200), "hello");

        let long = "x".repeat(300);
        assert_eq!(truncate_content(&long, 200).chars().count(), 200);

        // 多字节内容不会在字节边界截断
        let viet = "Nguyễn Văn A ".repeat(30);
        let truncated = truncate_content(&viet, 200);
        assert_eq!(truncated.chars().count(), 200);
        assert!(viet.starts_with(&truncated));
    }

    #[test]
    fn test_recent_entry_truncates() {
        let content = "y".repeat(500);
        let entry = RecentEntry::from_stored(7, MessageRole::Assistant, &content);
        assert_eq!(entry.id, 7);
        assert_eq!(entry.role, "assistant");
        assert_eq!(entry.content.chars().count(), RECENT_CONTENT_MAX_CHARS);
    }

    #[test]
    fn test_envelope_roundtrip() {
        let envelope = ShortTermEnvelope {
            data: HashMap::from([("step".to_string(), serde_json::json!(3))]),
            stored_at: Utc::now(),
            agent: "planner".to_string(),
        };
        let raw = serde_json::to_string(&envelope).unwrap();
        let back: ShortTermEnvelope = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.agent, "planner");
        assert_eq!(back.data.get("step"), Some(&serde_json::json!(3)));
    }
}
