//! In-Memory Project Store Implementation
//!
//! 用于本地运行和路由级测试的内存实现

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{
    NewProject, ProjectChange, ProjectQuery, ProjectRecord, ProjectStore, StoreError,
};

/// 内存 Project 存储
pub struct InMemoryProjectStore {
    projects: DashMap<Uuid, ProjectRecord>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self {
            projects: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn insert(&self, draft: NewProject) -> Result<ProjectRecord, StoreError> {
        let record = ProjectRecord {
            id: Uuid::new_v4(),
            name: draft.name,
            created: Utc::now(),
            updated: None,
        };
        self.projects.insert(record.id, record.clone());
        tracing::debug!(project_id = %record.id, "Project inserted");
        Ok(record)
    }

    async fn fetch(&self, ids: &[Uuid]) -> Result<Vec<ProjectRecord>, StoreError> {
        let mut records: Vec<ProjectRecord> = ids
            .iter()
            .filter_map(|id| self.projects.get(id).map(|r| r.clone()))
            .collect();
        records.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(records)
    }

    async fn update(&self, change: ProjectChange) -> Result<Option<ProjectRecord>, StoreError> {
        let Some(mut record) = self.projects.get_mut(&change.id) else {
            return Ok(None);
        };
        record.name = change.name;
        record.updated = Some(Utc::now());
        Ok(Some(record.clone()))
    }

    async fn remove(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut removed = 0;
        for id in ids {
            if self.projects.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn list(&self, query: ProjectQuery) -> Result<Vec<ProjectRecord>, StoreError> {
        let mut records: Vec<ProjectRecord> = self
            .projects
            .iter()
            .filter(|r| {
                if let Some(t) = query.created_gt {
                    if r.created <= t {
                        return false;
                    }
                }
                if let Some(t) = query.created_lt {
                    if r.created >= t {
                        return false;
                    }
                }
                if let Some(t) = query.updated_gt {
                    match r.updated {
                        Some(updated) if updated > t => {}
                        _ => return false,
                    }
                }
                if let Some(t) = query.updated_lt {
                    match r.updated {
                        Some(updated) if updated < t => {}
                        _ => return false,
                    }
                }
                true
            })
            .map(|r| r.clone())
            .collect();

        records.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(records)
    }
}
