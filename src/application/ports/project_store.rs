//! Project Store Port - 出站端口
//!
//! 定义 Project 表持久化的抽象接口
//! 具体实现在 infrastructure 层（Postgres / 内存）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Project 实体（用于持久化）
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub name: String,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

/// 新建 Project 的输入
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
}

/// 更新 Project 的输入
#[derive(Debug, Clone)]
pub struct ProjectChange {
    pub id: Uuid,
    pub name: String,
}

/// 列表查询过滤条件
///
/// 所有字段可选，时间比较均为严格大于/小于
#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    pub created_gt: Option<DateTime<Utc>>,
    pub created_lt: Option<DateTime<Utc>>,
    pub updated_gt: Option<DateTime<Utc>>,
    pub updated_lt: Option<DateTime<Utc>>,
}

/// Project 存储端口
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// 插入一条记录，id 和 created 由存储层生成
    async fn insert(&self, draft: NewProject) -> Result<ProjectRecord, StoreError>;

    /// 按 id 集合查询，缺失的 id 直接忽略
    async fn fetch(&self, ids: &[Uuid]) -> Result<Vec<ProjectRecord>, StoreError>;

    /// 更新记录并刷新 updated 时间戳，记录不存在时返回 None
    async fn update(&self, change: ProjectChange) -> Result<Option<ProjectRecord>, StoreError>;

    /// 按 id 集合删除，返回删除的行数
    async fn remove(&self, ids: &[Uuid]) -> Result<u64, StoreError>;

    /// 按过滤条件查询，created 降序排列
    async fn list(&self, query: ProjectQuery) -> Result<Vec<ProjectRecord>, StoreError>;
}
