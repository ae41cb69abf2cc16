//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `TABULA_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `TABULA_SERVER__HOST=127.0.0.1`
/// - `TABULA_SERVER__PORT=8080`
/// - `TABULA_DATABASE__DSN=postgres://app:app@db:5432/app`
/// - `TABULA_LOGSTASH__ENABLED=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.dsn", "")?
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432)?
        .set_default("database.database", "tabula")?
        .set_default("database.user", "postgres")?
        .set_default("database.password", "")?
        .set_default("database.min_connections", 5)?
        .set_default("database.max_connections", 75)?
        .set_default("logstash.enabled", false)?
        .set_default("logstash.host", "localhost")?
        .set_default("logstash.port", 5000)?
        .set_default("logstash.level", "info")?
        .set_default("logstash.service_name", "tabula")?
        .set_default("docs.enabled", true)?
        .set_default("sentry.enabled", false)?
        .set_default("sentry.dsn", "")?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: TABULA_
    // 层级分隔符: __ (双下划线)
    // 例如: TABULA_DATABASE__DSN=postgres://app:app@db:5432/app
    builder = builder.add_source(
        Environment::with_prefix("TABULA")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.logstash.enabled {
        if config.logstash.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "Logstash host cannot be empty when logstash is enabled".to_string(),
            ));
        }
        if config.logstash.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "Logstash service name cannot be empty".to_string(),
            ));
        }
    }

    if config.database.dsn.is_empty()
        && (config.database.host.is_empty() || config.database.database.is_empty())
    {
        return Err(ConfigError::ValidationError(
            "Database dsn or host/database must be set".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Database: {}:{}/{}", config.database.host, config.database.port, config.database.database);
    tracing::info!(
        "Database Pool: min={} max={}",
        config.database.min_connections,
        config.database.max_connections
    );
    tracing::info!("Logstash Enabled: {}", config.logstash.enabled);
    if config.logstash.enabled {
        tracing::info!("Logstash: {}:{}", config.logstash.host, config.logstash.port);
        tracing::info!("Logstash Level: {}", config.logstash.level);
        tracing::info!("Service Name: {}", config.logstash.service_name);
    }
    tracing::info!("Docs Enabled: {}", config.docs.enabled);
    tracing::info!("Sentry Enabled: {}", config.sentry.enabled);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
