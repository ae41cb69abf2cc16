//! Log Sink - 日志出口
//!
//! 进程启动时构造一次，经 AppState 传入每条请求处理路径，
//! 不依赖任何全局可变状态。
//!
//! 三种构造状态：
//! - disabled: 所有 emit 都是零成本空操作
//! - stream:   仅镜像到 tracing（stderr）
//! - connect:  tracing 镜像 + TCP JSON-lines 推送到远端收集器
//!
//! 运行期 sink 故障只丢事件，绝不影响请求处理。

use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use super::events::{EventLevel, LogEvent};

/// 写入队列深度，满了就丢（尽力而为，不阻塞请求）
const CHANNEL_CAPACITY: usize = 1024;

/// 日志 sink 错误
///
/// 只在启动建连时出现；建连失败是致命配置错误
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Log collector connection error: {0}. Check your config.")]
    Connect(std::io::Error),
}

enum SinkMode {
    Disabled,
    Stream,
    Network(mpsc::Sender<String>),
}

/// 日志出口句柄
pub struct LogSink {
    service_name: String,
    level: EventLevel,
    mode: SinkMode,
}

impl LogSink {
    /// 完全关闭的 sink，emit 为空操作
    pub fn disabled() -> Self {
        Self {
            service_name: String::new(),
            level: EventLevel::Info,
            mode: SinkMode::Disabled,
        }
    }

    /// 仅镜像到 tracing 的 sink
    pub fn stream(service_name: impl Into<String>, level: EventLevel) -> Self {
        Self {
            service_name: service_name.into(),
            level,
            mode: SinkMode::Stream,
        }
    }

    /// 建立到远端收集器的 TCP 连接
    ///
    /// 主机不可解析或连接被拒绝都作为错误返回，由调用方决定是否致命
    pub async fn connect(
        host: &str,
        port: u16,
        service_name: impl Into<String>,
        level: EventLevel,
    ) -> Result<Self, SinkError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(SinkError::Connect)?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(write_events(stream, rx));

        tracing::info!(host = %host, port = port, "Established connection to log collector");

        Ok(Self {
            service_name: service_name.into(),
            level,
            mode: SinkMode::Network(tx),
        })
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.mode, SinkMode::Disabled)
    }

    /// 事件是否会被记录（级别过滤 + 开关）
    pub fn accepts(&self, event: &LogEvent) -> bool {
        self.is_enabled() && event.level() >= self.level
    }

    /// 发出一个事件
    ///
    /// 序列化一次；tracing 镜像同步完成，网络推送交给写入任务。
    /// 队列满或连接已断时静默丢弃。
    pub fn emit(&self, event: &LogEvent) {
        if !self.accepts(event) {
            return;
        }

        let record = SinkRecord {
            service_name: &self.service_name,
            event,
        };
        let line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize log event");
                return;
            }
        };

        match event.level() {
            EventLevel::Error => {
                tracing::error!(extras = %line, "{} #{}", event.kind(), event.request_uuid());
            }
            _ => {
                tracing::info!(extras = %line, "{} #{}", event.kind(), event.request_uuid());
            }
        }

        if let SinkMode::Network(tx) = &self.mode {
            let mut line = line;
            line.push('\n');
            let _ = tx.try_send(line);
        }
    }
}

/// 线上记录：事件字段展开，附带服务名标签供下游过滤
#[derive(Serialize)]
struct SinkRecord<'a> {
    service_name: &'a str,
    #[serde(flatten)]
    event: &'a LogEvent,
}

async fn write_events(mut stream: TcpStream, mut rx: mpsc::Receiver<String>) {
    while let Some(line) = rx.recv().await {
        if let Err(e) = stream.write_all(line.as_bytes()).await {
            tracing::warn!(error = %e, "Log sink write failed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::logging::events::RequestEvent;
    use axum::body::Body;
    use axum::http::Request;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;
    use uuid::Uuid;

    fn request_event() -> LogEvent {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/create")
            .header("authorization", "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let (parts, _) = request.into_parts();
        LogEvent::Request(RequestEvent::from_parts(
            Uuid::new_v4(),
            &parts,
            br#"{"params": {"name": "Alpha"}}"#,
        ))
    }

    #[test]
    fn test_disabled_sink_is_noop() {
        let sink = LogSink::disabled();
        assert!(!sink.is_enabled());
        assert!(!sink.accepts(&request_event()));
        // 不会 panic，也没有任何副作用
        sink.emit(&request_event());
    }

    #[test]
    fn test_level_filters_info_events() {
        let sink = LogSink::stream("tabula", EventLevel::Error);
        assert!(!sink.accepts(&request_event()));
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let result = LogSink::connect("host.invalid", 1, "tabula", EventLevel::Info).await;
        assert!(matches!(result, Err(SinkError::Connect(_))));
    }

    #[tokio::test]
    async fn test_network_sink_delivers_tagged_records() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let sink = LogSink::connect("127.0.0.1", addr.port(), "tabula", EventLevel::Info)
            .await
            .unwrap();

        let (socket, _) = listener.accept().await.unwrap();
        sink.emit(&request_event());

        let mut reader = tokio::io::BufReader::new(socket);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();

        let record: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(record["service_name"], "tabula");
        assert_eq!(record["type"], "Request");
        assert_eq!(record["body"]["params"]["name"], "Alpha");
        assert!(record["headers"].get("authorization").is_none());
    }
}
