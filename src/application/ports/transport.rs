//! HTTP Transport Port - 出站 HTTP 传输抽象
//!
//! 只负责"发出请求，拿回响应或结构化失败"，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::StatusCode;
use thiserror::Error;

use crate::application::error::HttpError;

/// 出站请求支持的方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundMethod {
    Get,
    Post,
}

impl OutboundMethod {
    /// 忽略大小写解析方法名，不支持的方法返回 405
    pub fn parse(method: &str) -> Result<Self, HttpError> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            _ => Err(HttpError::new(
                format!("Unsupported HTTP Method \"{}\"", method),
                405,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// 传输层请求
///
/// GET 参数放在 `query`，POST 参数以表单编码放在 `form`
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: OutboundMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
    pub headers: Vec<(String, String)>,
    pub with_credentials: bool,
}

/// 传输层响应（任意状态码）
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// 传输错误
#[derive(Debug, Error)]
pub enum TransportError {
    /// 对端返回了错误状态码
    #[error("HTTP {status}")]
    Status { status: StatusCode, body: Bytes },

    /// 请求已发出但没有收到响应（连接失败、超时、读取中断）
    #[error("No response: {0}")]
    NoResponse(String),

    /// 请求无法构造或发送
    #[error("Request error: {0}")]
    Request(String),

    /// 已经是 HttpError，原样透传
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// HTTP Transport Port
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 发送一次请求
    ///
    /// 只要收到响应就返回 `Ok`，不论状态码
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
