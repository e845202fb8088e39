//! Infrastructure Layer - 基础设施层
//!
//! 提供端口的具体实现与 HTTP 服务

pub mod adapters;
pub mod http;
pub mod network;

pub use adapters::ReqwestTransport;
pub use self::http::{RouteBuilder, RouteContext, RouteError, RouteResult};
