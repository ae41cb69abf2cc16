//! Tabula - Project CRUD 服务
//!
//! 架构设计: Hexagonal Architecture
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ProjectStore）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 校验管道 + CRUD handler + 信封响应 + 自动文档
//! - Logging: ELK 风格请求/响应/错误事件出口
//! - Memory: ProjectStore 内存实现（测试用）
//! - Persistence: Postgres 存储

pub mod application;
pub mod config;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
