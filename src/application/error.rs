//! HTTP 错误定义
//!
//! 路由处理器与出站请求共用的统一错误类型：消息 + 状态码。
//! 序列化格式固定为 `{"error": {"message": "..."}}`，HTTP 状态码取自错误本身。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::time;

/// 未提供消息时的默认文案
pub const DEFAULT_ERROR_MESSAGE: &str = "Unknown Error";

/// 校验状态码
///
/// 仅接受 [100, 599]，其余（包括缺失）一律替换为 500 并输出警告，不视为失败
pub fn validate_status_code(code: Option<i64>) -> StatusCode {
    let status = code
        .filter(|c| (100..=599).contains(c))
        .and_then(|c| u16::try_from(c).ok())
        .and_then(|c| StatusCode::from_u16(c).ok());

    match (status, code) {
        (Some(status), _) => status,
        (None, Some(code)) => {
            tracing::warn!("Invalid status code \"{}\" given - using 500 instead", code);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        (None, None) => {
            tracing::warn!("Missing status code - using 500 instead");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// 错误响应体 `{"error": {"message": ...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// 交给自定义日志格式化函数的结构化字段
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord<'a> {
    pub message: &'a str,
    pub status_code: u16,
    pub timestamp: String,
}

/// HTTP 错误
///
/// 在处理器中返回该错误会被路由层拦截：先记录日志，再以自身状态码写出响应。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} - {}", .status.as_u16(), .message)]
pub struct HttpError {
    message: String,
    status: StatusCode,
}

impl HttpError {
    /// 使用消息和原始状态码创建错误
    pub fn new(message: impl Into<String>, status_code: i64) -> Self {
        Self {
            message: message.into(),
            status: validate_status_code(Some(status_code)),
        }
    }

    /// 两个参数都可缺省：消息默认 `Unknown Error`，状态码默认 500
    pub fn from_parts(message: Option<String>, status_code: Option<i64>) -> Self {
        Self {
            message: message.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            status: validate_status_code(status_code),
        }
    }

    /// 使用已有的 `StatusCode` 创建错误（超出 [100, 599] 同样回退为 500）
    pub fn with_status(message: impl Into<String>, status: StatusCode) -> Self {
        Self::new(message, i64::from(status.as_u16()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(message, StatusCode::BAD_REQUEST)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(message, StatusCode::NOT_FOUND)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_status(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// 响应体
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorMessage {
                message: self.message.clone(),
            },
        }
    }

    /// 以默认格式 `timestamp | status - message` 记录错误日志
    pub fn log(self) -> Self {
        tracing::error!(
            "{} | {} - {}",
            Self::timestamp(None),
            self.status_code(),
            self.message
        );
        self
    }

    /// 使用自定义格式化函数记录错误日志
    pub fn log_with<F>(self, formatter: F) -> Self
    where
        F: FnOnce(&ErrorRecord<'_>) -> String,
    {
        let record = ErrorRecord {
            message: &self.message,
            status_code: self.status_code(),
            timestamp: Self::timestamp(None),
        };
        let line = formatter(&record);
        tracing::error!("{}", line);
        self
    }

    /// 写出错误响应
    pub fn send(self) -> Response {
        self.into_response()
    }

    /// 把自身交给调用方提供的拒绝通道（oneshot、回调等）
    pub fn reject<T, F>(self, reject: F) -> T
    where
        F: FnOnce(Self) -> T,
    {
        reject(self)
    }

    pub fn timestamp(zone: Option<Tz>) -> String {
        time::timestamp(zone)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}
