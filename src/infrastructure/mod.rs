//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod http;
pub mod logging;
pub mod memory;
pub mod persistence;

pub use logging::{EventLevel, LogSink};
pub use memory::InMemoryProjectStore;
pub use persistence::postgres::PgProjectStore;
