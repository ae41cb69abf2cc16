//! Application State
//!
//! 每个请求处理路径共享的依赖：存储端口 + 日志出口。
//! 两者都在进程启动时构造一次，请求之间只读共享。

use std::sync::Arc;

use crate::application::ports::ProjectStore;
use crate::infrastructure::logging::LogSink;

/// 应用状态
pub struct AppState {
    pub store: Arc<dyn ProjectStore>,
    pub log_sink: Arc<LogSink>,
}

impl AppState {
    pub fn new(store: Arc<dyn ProjectStore>, log_sink: Arc<LogSink>) -> Self {
        Self { store, log_sink }
    }
}
