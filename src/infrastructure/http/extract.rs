//! Request Extraction
//!
//! 请求体/查询串/路径参数解析。框架的 rejection 统一转换为 HttpError，
//! 处理器里直接用 `?`。

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    Form, Json,
};
use serde::de::DeserializeOwned;

use crate::application::HttpError;

fn rejection(status: axum::http::StatusCode, message: String) -> HttpError {
    HttpError::with_status(message, status)
}

/// 解析 JSON 请求体
pub async fn json_body<T>(request: Request) -> Result<T, HttpError>
where
    T: DeserializeOwned,
{
    Json::<T>::from_request(request, &())
        .await
        .map(|Json(value)| value)
        .map_err(|e| rejection(e.status(), e.body_text()))
}

/// 解析 `application/x-www-form-urlencoded` 请求体
pub async fn form_body<T>(request: Request) -> Result<T, HttpError>
where
    T: DeserializeOwned,
{
    Form::<T>::from_request(request, &())
        .await
        .map(|Form(value)| value)
        .map_err(|e| rejection(e.status(), e.body_text()))
}

/// 解析查询串
pub fn query<T>(request: &Request) -> Result<T, HttpError>
where
    T: DeserializeOwned,
{
    Query::<T>::try_from_uri(request.uri())
        .map(|Query(value)| value)
        .map_err(|e| rejection(e.status(), e.body_text()))
}

/// 解析路径参数，返回参数和原请求（请求体未被消费）
pub async fn path_params<T>(request: Request) -> Result<(T, Request), HttpError>
where
    T: DeserializeOwned + Send,
{
    let (mut parts, body) = request.into_parts();
    let Path(value) = Path::<T>::from_request_parts(&mut parts, &())
        .await
        .map_err(|e| rejection(e.status(), e.body_text()))?;
    Ok((value, Request::from_parts(parts, body)))
}
