//! Configuration Types
//!
//! 定义所有配置结构体

use serde::{de::IgnoredAny, Deserialize, Deserializer};
use std::path::PathBuf;

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 3000;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口（缺失或无法解析时回退为 3000）
    #[serde(default = "default_port", deserialize_with = "deserialize_port")]
    pub port: u16,

    /// CORS 策略，未设置时不安装 CORS 中间件
    #[serde(default)]
    pub cors: Option<CorsPolicy>,

    /// 请求体大小上限（字节）
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,

    /// 是否附加安全响应头
    #[serde(default = "default_security_headers")]
    pub security_headers: bool,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_body_limit() -> usize {
    2 * 1024 * 1024 // 2 MB
}

fn default_security_headers() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: None,
            body_limit_bytes: default_body_limit(),
            security_headers: default_security_headers(),
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn cors(mut self, policy: CorsPolicy) -> Self {
        self.cors = Some(policy);
        self
    }

    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 端口原始输入
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawPort {
    Number(i64),
    Text(String),
    Other(IgnoredAny),
}

/// 把原始端口输入规整为合法端口，无效时回退为 3000 并输出警告
pub fn coerce_port(raw: Option<RawPort>) -> u16 {
    let parsed = match &raw {
        None => return DEFAULT_PORT,
        Some(RawPort::Number(n)) => u16::try_from(*n).ok(),
        Some(RawPort::Text(text)) => text.trim().parse::<u16>().ok(),
        Some(RawPort::Other(_)) => None,
    };

    parsed.unwrap_or_else(|| {
        tracing::warn!("Invalid port {:?} given - using {} instead", raw, DEFAULT_PORT);
        DEFAULT_PORT
    })
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPort>::deserialize(deserializer)?;
    Ok(coerce_port(raw))
}

/// CORS 策略
///
/// 配置为 `"*"` 或 `"allow-all"` 时允许所有来源；对象形式按原样传递给 CORS 层
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCorsPolicy")]
pub enum CorsPolicy {
    AllowAll,
    Explicit(CorsOptions),
}

/// 显式 CORS 配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CorsOptions {
    /// 允许的来源，单个字符串或列表
    #[serde(default, deserialize_with = "deserialize_origins")]
    pub origin: Option<Vec<String>>,

    /// 是否允许携带凭据
    #[serde(default)]
    pub credentials: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCorsPolicy {
    Keyword(String),
    Options(CorsOptions),
}

impl TryFrom<RawCorsPolicy> for CorsPolicy {
    type Error = String;

    fn try_from(raw: RawCorsPolicy) -> Result<Self, Self::Error> {
        match raw {
            RawCorsPolicy::Keyword(keyword) => match keyword.as_str() {
                "*" | "allow-all" => Ok(Self::AllowAll),
                other => Err(format!(
                    "unknown CORS policy \"{}\" (expected \"*\", \"allow-all\" or a table)",
                    other
                )),
            },
            RawCorsPolicy::Options(options) => Ok(Self::Explicit(options)),
        }
    }
}

fn deserialize_origins<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|origins| match origins {
        OneOrMany::One(origin) => vec![origin],
        OneOrMany::Many(origins) => origins,
    }))
}

/// 静态文件服务配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀（如 "/" 表示根路径托管）
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_enabled() -> bool {
    false
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
