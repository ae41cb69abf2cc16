//! Postgres Project Store

use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike, Utc};
use sqlx::{FromRow, QueryBuilder};
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{
    NewProject, ProjectChange, ProjectQuery, ProjectRecord, ProjectStore, StoreError,
};

/// Postgres Project Store
pub struct PgProjectStore {
    pool: DbPool,
}

impl PgProjectStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

// 时间戳入库前截断到秒，与响应序列化格式保持一致
fn now_db() -> NaiveDateTime {
    let now = Utc::now();
    now.with_nanosecond(0).unwrap_or(now).naive_utc()
}

#[derive(FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    created: NaiveDateTime,
    updated: Option<NaiveDateTime>,
}

impl From<ProjectRow> for ProjectRecord {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created: row.created.and_utc(),
            updated: row.updated.map(|updated| updated.and_utc()),
        }
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

const PROJECT_COLUMNS: &str = "id, name, created, updated";

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn insert(&self, draft: NewProject) -> Result<ProjectRecord, StoreError> {
        let row: ProjectRow = sqlx::query_as(
            "INSERT INTO project (id, name, created) VALUES ($1, $2, $3) \
             RETURNING id, name, created, updated",
        )
        .bind(Uuid::new_v4())
        .bind(&draft.name)
        .bind(now_db())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.into())
    }

    async fn fetch(&self, ids: &[Uuid]) -> Result<Vec<ProjectRecord>, StoreError> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            "SELECT id, name, created, updated FROM project \
             WHERE id = ANY($1) ORDER BY created DESC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(ProjectRecord::from).collect())
    }

    async fn update(&self, change: ProjectChange) -> Result<Option<ProjectRecord>, StoreError> {
        let row: Option<ProjectRow> = sqlx::query_as(
            "UPDATE project SET name = $2, updated = $3 WHERE id = $1 \
             RETURNING id, name, created, updated",
        )
        .bind(change.id)
        .bind(&change.name)
        .bind(now_db())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(ProjectRecord::from))
    }

    async fn remove(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM project WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected())
    }

    async fn list(&self, query: ProjectQuery) -> Result<Vec<ProjectRecord>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(PROJECT_COLUMNS);
        builder.push(" FROM project WHERE TRUE");

        if let Some(bound) = query.created_gt {
            builder.push(" AND created > ");
            builder.push_bind(bound.naive_utc());
        }
        if let Some(bound) = query.created_lt {
            builder.push(" AND created < ");
            builder.push_bind(bound.naive_utc());
        }
        if let Some(bound) = query.updated_gt {
            builder.push(" AND updated > ");
            builder.push_bind(bound.naive_utc());
        }
        if let Some(bound) = query.updated_lt {
            builder.push(" AND updated < ");
            builder.push_bind(bound.naive_utc());
        }

        builder.push(" ORDER BY created DESC");

        let rows: Vec<ProjectRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(ProjectRecord::from).collect())
    }
}
