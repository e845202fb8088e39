//! Outbound Request - 出站 HTTP 请求
//!
//! 在路由处理器中调用其他服务。所有失败（对端错误状态、无响应、无法构造请求、
//! 其他错误）都会归一化为 `HttpError`，与路由层使用同一条错误处理路径。

use std::sync::Arc;

use axum::body::Bytes;
use serde_json::Value;

use super::error::HttpError;
use super::ports::{
    HttpTransport, OutboundMethod, TransportError, TransportRequest, TransportResponse,
};

const NO_RESPONSE_MESSAGE: &str = "No response received";
const UNKNOWN_TRANSPORT_MESSAGE: &str = "Unknown transport error";

/// 出站请求参数
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// 仅在显式设置为 true 时携带凭据
    pub with_credentials: bool,
}

impl RequestOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }
}

/// 出站请求客户端
#[derive(Clone)]
pub struct OutboundRequest {
    transport: Arc<dyn HttpTransport>,
}

impl OutboundRequest {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// 按给定方法发送请求，成功时返回响应体
    ///
    /// 只支持 GET 与 POST，其他方法直接返回 405，不会发起网络请求
    pub async fn send(&self, method: &str, options: RequestOptions) -> Result<Value, HttpError> {
        let method = OutboundMethod::parse(method)?;
        let request = build_request(method, options);

        tracing::debug!(
            method = method.as_str(),
            url = %request.url,
            "Sending outbound request"
        );

        let response = self.transport.execute(request).await?;
        parse_response(response).map_err(HttpError::from)
    }

    pub async fn get(&self, options: RequestOptions) -> Result<Value, HttpError> {
        self.send("get", options).await
    }

    pub async fn post(&self, options: RequestOptions) -> Result<Value, HttpError> {
        self.send("post", options).await
    }
}

fn build_request(method: OutboundMethod, options: RequestOptions) -> TransportRequest {
    let RequestOptions {
        url,
        params,
        headers,
        with_credentials,
    } = options;

    let (query, form) = match method {
        OutboundMethod::Get => (params, None),
        OutboundMethod::Post => (Vec::new(), Some(params)),
    };

    TransportRequest {
        method,
        url,
        query,
        form,
        headers,
        with_credentials,
    }
}

fn parse_response(response: TransportResponse) -> Result<Value, TransportError> {
    if !response.status.is_success() {
        return Err(TransportError::Status {
            status: response.status,
            body: response.body,
        });
    }
    Ok(parse_body(&response.body))
}

/// JSON 响应体解析为 JSON，其余按文本返回
fn parse_body(body: &Bytes) -> Value {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// 从错误响应中提取消息：优先 `{"error": {"message"}}`，否则使用原始响应体
fn error_message(body: &Bytes) -> Option<String> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if map.contains_key("error") => {
            match map.get("error").and_then(|e| e.get("message")) {
                Some(Value::String(message)) => Some(message.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            }
        }
        Ok(Value::String(text)) => Some(text),
        _ => Some(String::from_utf8_lossy(body).into_owned()),
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

impl From<TransportError> for HttpError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status, body } => {
                HttpError::from_parts(error_message(&body), Some(i64::from(status.as_u16())))
            }
            TransportError::NoResponse(message) => {
                HttpError::bad_request(non_empty_or(message, NO_RESPONSE_MESSAGE))
            }
            TransportError::Request(message) => {
                HttpError::internal(non_empty_or(message, UNKNOWN_TRANSPORT_MESSAGE))
            }
            TransportError::Http(err) => err,
            TransportError::Other(err) => match err.downcast::<HttpError>() {
                Ok(err) => err,
                Err(err) => HttpError::internal(err.to_string()),
            },
        }
    }
}
