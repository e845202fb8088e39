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

use super::types::{AppConfig, CorsPolicy, DEFAULT_PORT};

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
/// # 环境变量示例
/// - `LAUNCHPAD_SERVER__HOST=127.0.0.1`
/// - `LAUNCHPAD_SERVER__PORT=8080`
/// - `LAUNCHPAD_SERVER__CORS=*`
/// - `LAUNCHPAD_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", i64::from(DEFAULT_PORT))?
        .set_default("server.body_limit_bytes", 2 * 1024 * 1024)?
        .set_default("server.security_headers", true)?
        .set_default("server.static_files.enabled", false)?
        .set_default("server.static_files.dir", "public")?
        .set_default("server.static_files.path", "/")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 前缀: LAUNCHPAD_，层级分隔符: __
    builder = builder.add_source(
        Environment::with_prefix("LAUNCHPAD")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.host.is_empty() {
        return Err(ConfigError::ValidationError(
            "Server host cannot be empty".to_string(),
        ));
    }

    if config.server.body_limit_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Body limit cannot be 0".to_string(),
        ));
    }

    let static_files = &config.server.static_files;
    if static_files.enabled && !static_files.path.starts_with('/') {
        return Err(ConfigError::ValidationError(format!(
            "Static files path must start with '/': {}",
            static_files.path
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    match &config.server.cors {
        None => tracing::info!("CORS: disabled"),
        Some(CorsPolicy::AllowAll) => tracing::info!("CORS: all origins"),
        Some(CorsPolicy::Explicit(options)) => tracing::info!(
            "CORS: origin={:?} credentials={:?}",
            options.origin,
            options.credentials
        ),
    }
    tracing::info!("Body Limit: {} bytes", config.server.body_limit_bytes);
    tracing::info!("Security Headers: {}", config.server.security_headers);
    if config.server.static_files.enabled {
        tracing::info!(
            "Static Files: {} -> {:?}",
            config.server.static_files.path,
            config.server.static_files.dir
        );
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
