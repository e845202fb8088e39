//! 应用层
//!
//! 包含：
//! - error: 统一 HTTP 错误（消息 + 状态码）
//! - outbound: 出站 HTTP 请求与失败归一化
//! - ports: 出站传输端口
//! - time: 时间戳工具

pub mod error;
pub mod outbound;
pub mod ports;
pub mod time;

pub use error::{
    validate_status_code, ErrorBody, ErrorMessage, ErrorRecord, HttpError, DEFAULT_ERROR_MESSAGE,
};
pub use outbound::{OutboundRequest, RequestOptions};
pub use ports::{
    HttpTransport, OutboundMethod, TransportError, TransportRequest, TransportResponse,
};
pub use time::timestamp;
