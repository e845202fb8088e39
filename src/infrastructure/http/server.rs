//! HTTP Server
//!
//! 构造阶段中间件的安装、监听与启动横幅

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::fallback::handle_panic;
use super::middleware::{cors_layer, error_logging_middleware, with_security_headers};
use crate::application::{time, TransportError};
use crate::config::ServerConfig;
use crate::infrastructure::network::network_address;

/// 启动错误
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to create outbound client: {0}")]
    Outbound(#[from] TransportError),

    #[error("Invalid route \"{path}\": {reason}")]
    InvalidRoute { path: String, reason: &'static str },

    #[error("Route \"{path}\" conflicts with previously registered route \"{existing}\"")]
    RouteConflict { path: String, existing: String },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// 启动完成后交给回调的信息
#[derive(Debug, Clone)]
pub struct LaunchInfo {
    pub local_addr: SocketAddr,
    pub port: u16,
}

impl LaunchInfo {
    /// 对外可访问的地址
    pub fn url(&self) -> String {
        format!("http://{}:{}", network_address(), self.port)
    }
}

/// 监听就绪后的动作
pub(crate) enum ReadyHook {
    Banner,
    Callback(Box<dyn FnOnce(&LaunchInfo) + Send>),
}

/// 在路由外侧安装构造阶段的中间件
///
/// 由内到外：panic 兜底、状态码日志、请求体上限、请求追踪、安全响应头、CORS
pub(crate) fn with_server_layers(router: Router, config: &ServerConfig) -> Router {
    let router = router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(error_logging_middleware))
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    let router = if config.security_headers {
        with_security_headers(router)
    } else {
        router
    };

    match &config.cors {
        Some(policy) => router.layer(cors_layer(policy)),
        None => router,
    }
}

/// 启动横幅
pub fn log_banner(info: &LaunchInfo) {
    info!("Started on {}", time::timestamp(None));
    info!("Running from {}...", info.url());
}

/// 绑定端口并开始服务，直到 shutdown 信号完成
pub(crate) async fn serve<F>(
    router: Router,
    config: &ServerConfig,
    ready: ReadyHook,
    shutdown_signal: F,
) -> Result<(), LaunchError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| LaunchError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(LaunchError::Serve)?;

    let launch_info = LaunchInfo {
        local_addr,
        port: local_addr.port(),
    };
    match ready {
        ReadyHook::Banner => log_banner(&launch_info),
        ReadyHook::Callback(callback) => callback(&launch_info),
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(LaunchError::Serve)?;

    info!("HTTP server on {} stopped", local_addr);
    Ok(())
}
