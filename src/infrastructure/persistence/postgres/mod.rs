//! Postgres Persistence - Postgres 数据库持久化实现

mod database;
mod project_store;

pub use database::*;
pub use project_store::*;
