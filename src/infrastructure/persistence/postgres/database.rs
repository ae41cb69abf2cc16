//! Postgres Database - 数据库连接和迁移

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::DatabaseConfig;

/// 数据库连接池
pub type DbPool = Pool<Postgres>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await?;

    tracing::info!(
        min = config.min_connections,
        max = config.max_connections,
        "Postgres pool created"
    );

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // 创建 project 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            created TIMESTAMP NOT NULL,
            updated TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 列表查询按 created 排序和过滤
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_project_created ON project (created)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed");

    Ok(())
}
