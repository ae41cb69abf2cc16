//! Log Events - 日志事件模型
//!
//! 每个请求产生一个 RequestEvent，随后恰好产生一个
//! ResponseEvent 或 ErrorEvent，三者共享同一个 request_uuid

use axum::http::{header, request::Parts};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::infrastructure::http::dto::ResponseFailure;

/// 日志事件，线上格式通过 type 字段区分
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum LogEvent {
    Request(RequestEvent),
    Response(ResponseEvent),
    Error(ErrorEvent),
}

impl LogEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LogEvent::Request(_) => "Request",
            LogEvent::Response(_) => "Response",
            LogEvent::Error(_) => "Error",
        }
    }

    pub fn request_uuid(&self) -> Uuid {
        match self {
            LogEvent::Request(e) => e.request_uuid,
            LogEvent::Response(e) => e.request_uuid,
            LogEvent::Error(e) => e.request_uuid,
        }
    }

    /// 事件级别：错误事件按 error 记录，其余按 info
    pub fn level(&self) -> EventLevel {
        match self {
            LogEvent::Error(_) => EventLevel::Error,
            _ => EventLevel::Info,
        }
    }
}

/// 事件级别，用于 sink 侧过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl EventLevel {
    /// 宽松解析配置字符串，未识别时回退为 info
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "debug" => EventLevel::Debug,
            "warning" | "warn" => EventLevel::Warning,
            "error" => EventLevel::Error,
            _ => EventLevel::Info,
        }
    }
}

/// 请求事件：头部（已脱敏）+ cookies + 请求体快照
#[derive(Debug, Clone, Serialize)]
pub struct RequestEvent {
    pub request_uuid: Uuid,
    pub url: String,
    pub method: String,
    pub body: Value,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
}

impl RequestEvent {
    /// 从请求头部和缓冲的请求体构造事件
    ///
    /// Authorization 头在这里剥除，绝不进入任何 sink
    pub fn from_parts(request_uuid: Uuid, parts: &Parts, body: &[u8]) -> Self {
        let mut headers = BTreeMap::new();
        for (name, value) in &parts.headers {
            if name == header::AUTHORIZATION {
                continue;
            }
            headers.insert(
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }

        Self {
            request_uuid,
            url: parts.uri.to_string(),
            method: parts.method.to_string(),
            body: body_snapshot(body),
            headers,
            cookies: parse_cookies(parts),
        }
    }
}

/// 响应事件：状态码 + 耗时（秒）
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEvent {
    pub request_uuid: Uuid,
    pub url: String,
    pub method: String,
    pub body: Value,
    pub status_code: u16,
    pub execution_time: f64,
}

/// 错误事件：状态码 + 失败信封 + 调用栈
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub request_uuid: Uuid,
    pub url: String,
    pub method: String,
    pub body: Value,
    pub status_code: u16,
    pub error_info: ResponseFailure,
    pub traceback: Option<String>,
}

/// 请求/响应体快照：能解析成 JSON 就按 JSON 记录，否则按原文字符串
pub fn body_snapshot(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::String(String::new());
    }

    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

fn parse_cookies(parts: &Parts) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();

    for value in parts.headers.get_all(header::COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    cookies
}
