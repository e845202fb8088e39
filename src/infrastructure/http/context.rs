//! Route Context
//!
//! 每次调用处理器或中间件时显式传入的上下文

use std::sync::Arc;

use crate::application::{HttpError, OutboundRequest};
use crate::config::ServerConfig;

/// 路由上下文
///
/// 暴露用户状态、出站请求客户端和服务器配置
#[derive(Clone)]
pub struct RouteContext<S> {
    state: S,
    outbound: OutboundRequest,
    config: Arc<ServerConfig>,
}

impl<S> RouteContext<S> {
    pub fn new(state: S, outbound: OutboundRequest, config: Arc<ServerConfig>) -> Self {
        Self {
            state,
            outbound,
            config,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn outbound(&self) -> &OutboundRequest {
        &self.outbound
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// 构造一个 HttpError，配合 `?` 在处理器中提前返回
    pub fn error(&self, message: impl Into<String>, status_code: i64) -> HttpError {
        HttpError::new(message, status_code)
    }
}
