//! Persistence Layer - 数据持久化
//!
//! Postgres 存储实现

pub mod postgres;

pub use postgres::PgProjectStore;
