//! Route Error Handling
//!
//! 处理器可以用 `?` 返回任意错误。到达路由边界时按类型分流：
//! - `HttpError`：记录日志并以自身状态码直接响应
//! - 其他错误：转交给最外层的兜底错误处理器，统一返回 500

use std::fmt;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::HttpError;

/// 路由处理器返回值
pub type RouteResult<T = Response> = Result<T, RouteError>;

/// 路由处理器错误
pub struct RouteError(anyhow::Error);

/// 错误分类结果
#[derive(Debug)]
pub enum Failure {
    /// 预期内的业务错误
    Typed(HttpError),
    /// 其他任何错误
    Unexpected(anyhow::Error),
}

impl RouteError {
    pub fn classify(self) -> Failure {
        match self.0.downcast::<HttpError>() {
            Ok(err) => Failure::Typed(err),
            Err(err) => Failure::Unexpected(err),
        }
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.0
    }
}

impl fmt::Debug for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<E> From<E> for RouteError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// 交给兜底处理器的错误，挂在响应扩展上向外传递
#[derive(Clone)]
pub(crate) struct ForwardedError(pub(crate) Arc<anyhow::Error>);

/// 标记响应由已注册的路由或中间件产生
#[derive(Clone, Copy)]
pub(crate) struct Dispatched;

/// 把错误转交给兜底处理器
pub(crate) fn forward(err: anyhow::Error) -> Response {
    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response
        .extensions_mut()
        .insert(ForwardedError(Arc::new(err)));
    response
}

/// 路由边界：HttpError 就地响应，其余转交
pub(crate) fn resolve_route_error(err: RouteError) -> Response {
    match err.classify() {
        Failure::Typed(err) => err.log().into_response(),
        Failure::Unexpected(err) => forward(err),
    }
}

pub(crate) fn mark_dispatched(mut response: Response) -> Response {
    response.extensions_mut().insert(Dispatched);
    response
}
