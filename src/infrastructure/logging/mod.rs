//! Logging Layer - 请求级结构化日志
//!
//! 事件模型 + 远端/本地日志出口

pub mod events;
pub mod sink;

pub use events::{body_snapshot, ErrorEvent, EventLevel, LogEvent, RequestEvent, ResponseEvent};
pub use sink::{LogSink, SinkError};
