//! Ping Handler
//!
//! 健康检查

use axum::{extract::Request, Json};
use serde::Serialize;

use crate::infrastructure::http::{RouteContext, RouteResult};

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Ping endpoint - 健康检查
pub async fn ping<S>(_ctx: RouteContext<S>, _request: Request) -> RouteResult<Json<PingResponse>>
where
    S: Send + Sync,
{
    Ok(Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: crate::application::timestamp(None),
    }))
}
