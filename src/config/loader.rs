use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use std::path::PathBuf;

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 搜索路径：
    /// 1. ./config.toml
    /// 2. 环境变量（MNEMO_ 前缀）
    pub fn load() -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(figment::providers::Serialized::defaults(
            AppConfig::development(),
        ))
        .merge(Toml::file("config.toml"))
        .merge(Env::prefixed("MNEMO_").split("_").global());

        figment.extract()
    }

    /// 从指定路径加载配置
    pub fn load_from(path: PathBuf) -> Result<AppConfig, figment::Error> {
        let figment = Figment::from(figment::providers::Serialized::defaults(
            AppConfig::development(),
        ))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MNEMO_").split("_").global());

        figment.extract()
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.database.url.is_empty() {
            return Err(ConfigValidationError::MissingDatabaseUrl);
        }

        if config.database.query_timeout == 0 {
            return Err(ConfigValidationError::InvalidQueryTimeout);
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("数据库连接 URL 未配置")]
    MissingDatabaseUrl,

    #[error("查询超时无效，必须大于 0")]
    InvalidQueryTimeout,
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}

/// 检查配置文件是否存在
pub fn config_exists() -> bool {
    default_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = AppConfig::development();
        config.server.port = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        ));
    }

    #[test]
    fn test_validate_rejects_missing_database_url() {
        let mut config = AppConfig::development();
        config.database.url = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::MissingDatabaseUrl)
        ));
    }

    #[test]
    fn test_validate_accepts_development() {
        assert!(ConfigLoader::validate(&AppConfig::development()).is_ok());
    }
}
