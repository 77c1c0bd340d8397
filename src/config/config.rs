use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 数据库配置（持久层，SurrealDB）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SurrealDB 连接地址
    pub url: String,
    /// 命名空间
    pub namespace: String,
    /// 数据库名称
    pub database: String,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 连接超时（秒）
    pub connection_timeout: u64,
    /// 单次查询超时（秒）
    pub query_timeout: u64,
}

/// 缓存配置（短期记忆层，Redis）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis 连接地址
    pub url: String,
    /// 单次操作超时（毫秒）
    pub op_timeout_ms: u64,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 请求超时（秒）
    pub request_timeout: u64,
    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化日志格式
    pub structured: bool,
    /// 日志文件路径
    pub log_dir: Option<PathBuf>,
}

/// 整合引擎配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// 是否对长期未提及的实体应用重要性衰减
    ///
    /// 默认关闭：知识图谱不会自动遗忘，实体一经记录即长期保留。
    pub entity_decay: bool,
    /// 实体视为陈旧的天数（仅在 entity_decay 开启时生效）
    pub entity_stale_days: u32,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 缓存配置
    pub cache: CacheConfig,
    /// 服务器配置
    pub server: ServerConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 整合引擎配置
    pub consolidation: ConsolidationConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            database: DatabaseConfig {
                url: "ws://localhost:8000".into(),
                namespace: "mnemo".into(),
                database: "memory".into(),
                username: "root".into(),
                password: "root".into(),
                connection_timeout: 30,
                query_timeout: 5,
            },
            cache: CacheConfig {
                url: "redis://localhost:6379".into(),
                op_timeout_ms: 2000,
            },
            server: ServerConfig {
                host: "0.0.0.0".into(),
                port: 8085,
                request_timeout: 30,
                max_request_size: 10 * 1024 * 1024,
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: true,
                log_dir: Some(PathBuf::from("./logs")),
            },
            consolidation: ConsolidationConfig {
                entity_decay: false,
                entity_stale_days: 30,
            },
            app_name: "mnemo".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.environment, "development");
        assert_eq!(config.database.query_timeout, 5);
        assert!(!config.consolidation.entity_decay);
    }

    #[test]
    fn test_production_overrides() {
        let config = AppConfig::production();
        assert_eq!(config.environment, "production");
        assert_eq!(config.logging.level, "info");
    }
}
