//! Reqwest Transport - 基于 reqwest 的出站 HTTP 传输
//!
//! 实现 HttpTransport trait。错误按阶段分类：
//! - 无法构造请求（URL、header 非法）→ `TransportError::Request`
//! - 已发出但未收到完整响应（连接失败、超时、读取中断）→ `TransportError::NoResponse`

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::application::ports::{
    HttpTransport, OutboundMethod, TransportError, TransportRequest, TransportResponse,
};

/// Reqwest 传输
///
/// `with_credentials` 的请求走启用了 cookie store 的独立客户端
pub struct ReqwestTransport {
    client: Client,
    credentialed: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let credentialed = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            credentialed,
        })
    }

    fn client_for(&self, with_credentials: bool) -> &Client {
        if with_credentials {
            &self.credentialed
        } else {
            &self.client
        }
    }
}

fn build_headers(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::Request(format!("Invalid header name {:?}: {}", name, e)))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::Request(format!("Invalid value for header {:?}: {}", name, e))
        })?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::Request(e.to_string())
    } else if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode() {
        TransportError::NoResponse(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let headers = build_headers(&request.headers)?;
        let client = self.client_for(request.with_credentials);

        let mut builder = match request.method {
            OutboundMethod::Get => client.get(&request.url),
            OutboundMethod::Post => client.post(&request.url),
        }
        .headers(headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;

        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            status = status.as_u16(),
            body_len = body.len(),
            "Outbound request completed"
        );

        Ok(TransportResponse { status, body })
    }
}
