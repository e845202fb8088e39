//! Launchpad - 可链式注册路由的 HTTP 服务脚手架
//!
//! 应用层 (application/):
//! - HttpError: 带状态码校验的统一错误，负责日志与响应体
//! - OutboundRequest: 出站 GET/POST，所有失败归一化为 HttpError
//! - Ports: 出站传输端口（HttpTransport）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RouteBuilder、路由上下文、兜底处理与构造阶段中间件
//! - Adapters: 基于 reqwest 的传输实现
//! - Network: 本机地址探测

pub mod application;
pub mod config;
pub mod infrastructure;

pub use application::{HttpError, OutboundRequest, RequestOptions};
pub use config::{load_config, AppConfig, CorsPolicy, ServerConfig};
pub use infrastructure::http::{RouteBuilder, RouteContext, RouteError, RouteResult};
