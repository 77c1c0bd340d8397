//! 可观测性模块
//!
//! 提供 Prometheus 文本格式指标、结构化日志和健康检查。

use axum::{Json, Router, response::IntoResponse, routing::get};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// ===== Simple Metrics (using atomics for zero-dep implementation) =====

/// 存储层级（用于计数指标）
#[derive(Debug, Clone, Copy)]
pub enum StoreTier {
    ShortTerm,
    Conversation,
    Entity,
    Working,
}

/// 简单应用指标
#[derive(Clone, Default)]
pub struct AppMetrics {
    pub http_requests_total: Arc<AtomicU64>,
    pub http_request_duration_sum: Arc<AtomicU64>,
    pub active_connections: Arc<AtomicUsize>,
    pub short_term_stored_total: Arc<AtomicU64>,
    pub conversations_stored_total: Arc<AtomicU64>,
    pub entities_stored_total: Arc<AtomicU64>,
    pub working_stored_total: Arc<AtomicU64>,
    pub cache_hits_total: Arc<AtomicU64>,
    pub cache_misses_total: Arc<AtomicU64>,
    pub search_requests_total: Arc<AtomicU64>,
    pub consolidation_runs_total: Arc<AtomicU64>,
    pub cleanup_runs_total: Arc<AtomicU64>,
    pub errors_total: Arc<AtomicU64>,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::SeqCst);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::SeqCst);
    }

    /// 记录活跃连接
    pub fn record_connection(&self, delta: isize) {
        self.active_connections
            .fetch_add(delta as usize, Ordering::SeqCst);
    }

    /// 记录一次写入
    pub fn record_store(&self, tier: StoreTier) {
        let counter = match tier {
            StoreTier::ShortTerm => &self.short_term_stored_total,
            StoreTier::Conversation => &self.conversations_stored_total,
            StoreTier::Entity => &self.entities_stored_total,
            StoreTier::Working => &self.working_stored_total,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录缓存命中
    pub fn record_cache_hit(&self) {
        self.cache_hits_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录缓存未命中
    pub fn record_cache_miss(&self) {
        self.cache_misses_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录搜索请求
    pub fn record_search(&self) {
        self.search_requests_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录整合触发
    pub fn record_consolidation(&self) {
        self.consolidation_runs_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录清理执行
    pub fn record_cleanup(&self) {
        self.cleanup_runs_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录错误
    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::SeqCst);
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds histogram
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP active_connections Active HTTP connections
# TYPE active_connections gauge
active_connections {}
# HELP short_term_stored_total Short-term cache entries stored
# TYPE short_term_stored_total counter
short_term_stored_total {}
# HELP conversations_stored_total Conversation records stored
# TYPE conversations_stored_total counter
conversations_stored_total {}
# HELP entities_stored_total Entity upserts applied
# TYPE entities_stored_total counter
entities_stored_total {}
# HELP working_stored_total Working-memory upserts applied
# TYPE working_stored_total counter
working_stored_total {}
# HELP cache_hits_total Recent-list and short-term cache hits
# TYPE cache_hits_total counter
cache_hits_total {}
# HELP cache_misses_total Recent-list and short-term cache misses
# TYPE cache_misses_total counter
cache_misses_total {}
# HELP search_requests_total Total search requests
# TYPE search_requests_total counter
search_requests_total {}
# HELP consolidation_runs_total Consolidation runs triggered
# TYPE consolidation_runs_total counter
consolidation_runs_total {}
# HELP cleanup_runs_total Cleanup sweeps executed
# TYPE cleanup_runs_total counter
cleanup_runs_total {}
# HELP errors_total Total errors
# TYPE errors_total counter
errors_total {}
"#,
            self.http_requests_total.load(Ordering::SeqCst),
            self.http_request_duration_sum.load(Ordering::SeqCst) as f64 / 1000.0,
            self.http_requests_total.load(Ordering::SeqCst),
            self.active_connections.load(Ordering::SeqCst),
            self.short_term_stored_total.load(Ordering::SeqCst),
            self.conversations_stored_total.load(Ordering::SeqCst),
            self.entities_stored_total.load(Ordering::SeqCst),
            self.working_stored_total.load(Ordering::SeqCst),
            self.cache_hits_total.load(Ordering::SeqCst),
            self.cache_misses_total.load(Ordering::SeqCst),
            self.search_requests_total.load(Ordering::SeqCst),
            self.consolidation_runs_total.load(Ordering::SeqCst),
            self.cleanup_runs_total.load(Ordering::SeqCst),
            self.errors_total.load(Ordering::SeqCst),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub cache_enabled: bool,
}

/// 应用状态（用于健康检查）
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub start_time: DateTime<Utc>,
    pub version: String,
    /// 缓存层是否在启动时接通（禁用态不算不健康，只是降级）
    pub cache_enabled: bool,
}

impl ObservabilityState {
    pub fn new(version: String, metrics: Arc<AppMetrics>, cache_enabled: bool) -> Self {
        Self {
            metrics,
            start_time: Utc::now(),
            version,
            cache_enabled,
        }
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_seconds() as f64
    }
}

// ===== Health Check Handlers =====

/// 获取健康状态
pub async fn health_check(
    state: axum::extract::State<Arc<ObservabilityState>>,
) -> impl IntoResponse {
    Json(HealthStatus {
        status: "healthy".to_string(),
        service: "context-storage".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        cache_enabled: state.cache_enabled,
    })
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// 就绪检查
pub async fn readiness() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "Ready")
}

/// Prometheus 指标端点
pub async fn metrics(state: axum::extract::State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let output = state.metrics.gather();
    (axum::http::StatusCode::OK, output)
}

/// 版本信息端点
pub async fn version(state: axum::extract::State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Structured Logging =====

/// 初始化结构化日志
pub fn init_tracing(service_name: &str) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| format!("info,{}", service_name));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_gather() {
        let metrics = AppMetrics::default();
        metrics.record_http_request(100);
        metrics.record_connection(1);
        metrics.record_store(StoreTier::Conversation);
        metrics.record_store(StoreTier::Entity);
        metrics.record_cache_hit();
        metrics.record_search();
        metrics.record_error();

        let output = metrics.gather();
        assert!(output.contains("http_requests_total 1"));
        assert!(output.contains("active_connections 1"));
        assert!(output.contains("conversations_stored_total 1"));
        assert!(output.contains("entities_stored_total 1"));
        assert!(output.contains("cache_hits_total 1"));
        assert!(output.contains("search_requests_total 1"));
        assert!(output.contains("errors_total 1"));
    }

    #[test]
    fn test_health_status_structure() {
        let status = HealthStatus {
            status: "healthy".to_string(),
            service: "context-storage".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            version: "0.1.0".to_string(),
            uptime_seconds: 3600.0,
            cache_enabled: true,
        };

        assert_eq!(status.status, "healthy");
        assert_eq!(status.service, "context-storage");
    }

    #[test]
    fn test_store_tier_counters_are_independent() {
        let metrics = AppMetrics::default();
        metrics.record_store(StoreTier::ShortTerm);
        metrics.record_store(StoreTier::Working);
        metrics.record_store(StoreTier::Working);

        assert_eq!(metrics.short_term_stored_total.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.working_stored_total.load(Ordering::SeqCst), 2);
        assert_eq!(metrics.conversations_stored_total.load(Ordering::SeqCst), 0);
    }
}
