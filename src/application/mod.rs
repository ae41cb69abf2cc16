//! 应用层
//!
//! 包含：
//! - ports: 六边形架构端口定义（ProjectStore）

pub mod ports;

pub use ports::{
    NewProject, ProjectChange, ProjectQuery, ProjectRecord, ProjectStore, StoreError,
};
