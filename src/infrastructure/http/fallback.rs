//! Catch-all Handlers
//!
//! 所有用户路由之后的兜底处理：
//! - 未匹配的路由 → 404 `Route Does Not Exist`
//! - 转交过来的错误 → HttpError 按自身状态码响应，其余 500 `Internal Server Error`
//! - panic → 500 `Internal Server Error`

use std::any::Any;

use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::{Dispatched, ForwardedError};
use crate::application::HttpError;

pub const NOT_FOUND_BODY: &str = "Route Does Not Exist";
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// 404 兜底
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}

/// 兜底错误处理中间件
///
/// 路径匹配但方法不匹配时框架返回的 405 同样按未匹配路由处理
pub async fn catch_all_errors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    if let Some(ForwardedError(err)) = response.extensions_mut().remove::<ForwardedError>() {
        return respond_to_error(&err);
    }

    if response.status() == StatusCode::METHOD_NOT_ALLOWED
        && response.extensions().get::<Dispatched>().is_none()
    {
        return not_found().await;
    }

    response
}

fn respond_to_error(err: &anyhow::Error) -> Response {
    match err.downcast_ref::<HttpError>() {
        Some(typed) => typed.clone().log().into_response(),
        None => {
            tracing::error!(error = ?err, "Unhandled route error");
            internal_error()
        }
    }
}

/// panic 处理，用于 `CatchPanicLayer::custom`
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Route handler panicked");

    let mut response = Response::new(Body::from(INTERNAL_ERROR_BODY));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        CONTENT_TYPE,
        axum::http::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
