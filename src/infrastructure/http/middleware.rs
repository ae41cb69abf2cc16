//! HTTP Middleware
//!
//! 请求观测中间件：请求/响应/错误事件记录 + 耗时统计
//!
//! 每个请求的事件顺序固定：RequestEvent 在 handler 调用前发出，
//! ResponseEvent 或 ErrorEvent 在响应写回前发出，三者共享 request_uuid。
//! handler panic 由 [`panic_response`] 收口为 500 失败信封，绝不逃逸。

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::error::{ApiError, ErrorMeta};
use super::server::BODY_LIMIT;
use super::state::AppState;
use crate::infrastructure::logging::{
    body_snapshot, ErrorEvent, LogEvent, RequestEvent, ResponseEvent,
};

/// 请求观测中间件
pub async fn observe(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let request_uuid = Uuid::new_v4();

    // 缓冲请求体，读取上限与服务器配置一致，超限即拒绝
    let (parts, body) = request.into_parts();
    let (request_bytes, read_error) = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => (bytes, None),
        Err(e) => (Bytes::new(), Some(ApiError::from_read_error(e))),
    };

    let request_event = RequestEvent::from_parts(request_uuid, &parts, &request_bytes);
    let url = request_event.url.clone();
    let method = request_event.method.clone();

    // RequestEvent 严格先于 handler 调用
    state.log_sink.emit(&LogEvent::Request(request_event));

    let started = Instant::now();
    let response = match read_error {
        Some(e) => e.into_response(),
        None => {
            let request = Request::from_parts(parts, Body::from(request_bytes.clone()));
            next.run(request).await
        }
    };
    let execution_time = started.elapsed().as_secs_f64();

    let (parts, body) = response.into_parts();
    let response_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();

    let event = match parts.extensions.get::<ErrorMeta>() {
        Some(meta) => LogEvent::Error(ErrorEvent {
            request_uuid,
            url,
            method,
            body: body_snapshot(&request_bytes),
            status_code: meta.status.as_u16(),
            error_info: meta.envelope.clone(),
            traceback: meta.backtrace.as_ref().map(|b| b.to_string()),
        }),
        None => LogEvent::Response(ResponseEvent {
            request_uuid,
            url,
            method,
            body: body_snapshot(&response_bytes),
            status_code: parts.status.as_u16(),
            execution_time,
        }),
    };

    // ResponseEvent / ErrorEvent 严格先于响应写回
    state.log_sink.emit(&event);

    Response::from_parts(parts, Body::from(response_bytes))
}

/// handler panic → 500 失败信封
///
/// 交给 tower-http 的 CatchPanicLayer 使用；附带 ErrorMeta，
/// 使外层观测中间件照常产出 ErrorEvent
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else {
        "Unexpected panic in request handler.".to_string()
    };

    ApiError::internal(message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::dto::{Envelope, ResponseFailure};
    use crate::infrastructure::logging::{EventLevel, LogSink};
    use crate::infrastructure::memory::InMemoryProjectStore;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{middleware, Json, Router};
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;
    use tower::util::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    async fn ok_handler() -> Json<Envelope<&'static str>> {
        Json(Envelope::success("ok"))
    }

    async fn failing_handler() -> Result<Json<Envelope<&'static str>>, ApiError> {
        Err(ApiError::Validation("missing field `name`".to_string()))
    }

    async fn panicking_handler() -> Json<Envelope<&'static str>> {
        panic!("handler exploded");
    }

    fn test_router(sink: LogSink) -> Router {
        let state = Arc::new(AppState::new(
            InMemoryProjectStore::new().arc(),
            Arc::new(sink),
        ));
        Router::new()
            .route("/ok", post(ok_handler))
            .route("/fail", post(failing_handler))
            .route("/panic", post(panicking_handler))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(state.clone(), observe))
            .with_state(state)
    }

    async fn send(router: Router, path: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_response_passes_through_unchanged() {
        let (status, bytes) = send(test_router(LogSink::disabled()), "/ok", "{}").await;
        assert_eq!(status, StatusCode::OK);
        let envelope: Envelope<String> = serde_json::from_slice(&bytes).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.result, "ok");
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error_envelope() {
        let (status, bytes) = send(test_router(LogSink::disabled()), "/panic", "{}").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let envelope: ResponseFailure = serde_json::from_slice(&bytes).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.result.error_type, "InternalError");
        assert_eq!(envelope.result.error_message, "handler exploded");
    }

    #[tokio::test]
    async fn test_request_then_response_events_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let sink = LogSink::connect("127.0.0.1", port, "tabula", EventLevel::Info)
            .await
            .unwrap();
        let (socket, _) = listener.accept().await.unwrap();

        let (status, _) = send(test_router(sink), "/ok", r#"{"hello": 1}"#).await;
        assert_eq!(status, StatusCode::OK);

        let mut reader = tokio::io::BufReader::new(socket);
        let mut line = String::new();

        reader.read_line(&mut line).await.unwrap();
        let first: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(first["type"], "Request");
        assert_eq!(first["body"]["hello"], 1);

        line.clear();
        reader.read_line(&mut line).await.unwrap();
        let second: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(second["type"], "Response");
        assert_eq!(second["request_uuid"], first["request_uuid"]);
        assert_eq!(second["status_code"], 200);
        assert!(second["execution_time"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn test_handler_error_produces_error_event() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let sink = LogSink::connect("127.0.0.1", port, "tabula", EventLevel::Info)
            .await
            .unwrap();
        let (socket, _) = listener.accept().await.unwrap();

        let (status, _) = send(test_router(sink), "/fail", r#"{"params": {}}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut reader = tokio::io::BufReader::new(socket);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap(); // RequestEvent

        line.clear();
        reader.read_line(&mut line).await.unwrap();
        let event: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(event["type"], "Error");
        assert_eq!(event["status_code"], 400);
        assert_eq!(event["error_info"]["success"], false);
        assert_eq!(event["error_info"]["result"]["error_type"], "ValidationError");
        // 错误事件记录的是请求体快照
        assert_eq!(event["body"]["params"], serde_json::json!({}));
    }
}
