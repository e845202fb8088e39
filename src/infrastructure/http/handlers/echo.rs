//! Echo Handler
//!
//! 原样返回 JSON 或表单请求体，用于联调客户端

use axum::{
    extract::Request,
    http::header::CONTENT_TYPE,
    Json,
};
use serde_json::{Map, Value};

use crate::application::HttpError;
use crate::infrastructure::http::{extract, RouteContext, RouteResult};

pub async fn echo<S>(_ctx: RouteContext<S>, request: Request) -> RouteResult<Json<Value>>
where
    S: Send + Sync,
{
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = if content_type.starts_with("application/json") {
        extract::json_body::<Value>(request).await?
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let fields: Vec<(String, String)> = extract::form_body(request).await?;
        Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect::<Map<String, Value>>(),
        )
    } else {
        return Err(HttpError::new(
            format!("Unsupported content type \"{}\"", content_type),
            415,
        )
        .into());
    };

    Ok(Json(body))
}
