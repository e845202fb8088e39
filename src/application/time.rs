//! 时间戳工具

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;

/// 日志时间戳格式，例如 `10/15/2026, 02:07:09 PM`
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

/// 生成当前时间戳
///
/// 时区为 IANA 名称对应的 `Tz`（如 `"America/New_York".parse()`），未指定时使用本地时区
pub fn timestamp(zone: Option<Tz>) -> String {
    format_instant(Utc::now(), zone)
}

/// 按时间戳格式输出给定时刻
pub fn format_instant(instant: DateTime<Utc>, zone: Option<Tz>) -> String {
    match zone {
        Some(zone) => instant
            .with_timezone(&zone)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        None => instant
            .with_timezone(&Local)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
    }
}
