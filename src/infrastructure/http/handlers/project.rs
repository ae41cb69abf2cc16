//! Project HTTP Handlers
//!
//! 单表 CRUD。所有输入已由校验管道构造完成，
//! 这里只做端口调用和信封包装。

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::ports::{NewProject, ProjectChange, ProjectQuery};
use crate::infrastructure::http::dto::{
    Empty, Envelope, Project, ProjectListFilter, RequestProjectCreate, RequestProjectDelete,
    RequestProjectList, RequestProjectRead, RequestProjectUpdate, ResponseFailure,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::pipeline::Validated;
use crate::infrastructure::http::state::AppState;

impl From<ProjectListFilter> for ProjectQuery {
    fn from(filter: ProjectListFilter) -> Self {
        Self {
            created_gt: filter.created_gt,
            created_lt: filter.created_lt,
            updated_gt: filter.updated_gt,
            updated_lt: filter.updated_lt,
        }
    }
}

/// 创建 Project
#[utoipa::path(
    post,
    path = "/api/v1/create",
    tag = "Project",
    request_body = RequestProjectCreate,
    responses(
        (status = 200, description = "Created project.", body = Envelope<Project>),
        (status = 400, description = "Bad request.", body = ResponseFailure),
        (status = 500, description = "Internal server error.", body = ResponseFailure),
    ),
)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Validated(request): Validated<RequestProjectCreate>,
) -> Result<Json<Envelope<Project>>, ApiError> {
    let record = state
        .store
        .insert(NewProject {
            name: request.params.name,
        })
        .await?;

    tracing::info!(project_id = %record.id, "Project created");

    Ok(Json(Envelope::success(record.into())))
}

/// 按 id 集合读取 Project
#[utoipa::path(
    post,
    path = "/api/v1/read",
    tag = "Project",
    request_body = RequestProjectRead,
    responses(
        (status = 200, description = "Matching projects.", body = Envelope<Vec<Project>>),
        (status = 400, description = "Bad request.", body = ResponseFailure),
        (status = 500, description = "Internal server error.", body = ResponseFailure),
    ),
)]
pub async fn read(
    State(state): State<Arc<AppState>>,
    Validated(request): Validated<RequestProjectRead>,
) -> Result<Json<Envelope<Vec<Project>>>, ApiError> {
    let records = state.store.fetch(&request.params).await?;

    Ok(Json(Envelope::success(
        records.into_iter().map(Project::from).collect(),
    )))
}

/// 更新 Project
///
/// 记录不存在按业务警告处理：传输层 200，信封 success=false
#[utoipa::path(
    post,
    path = "/api/v1/update",
    tag = "Project",
    request_body = RequestProjectUpdate,
    responses(
        (status = 200, description = "Updated project, or a business warning.", body = Envelope<Project>),
        (status = 400, description = "Bad request.", body = ResponseFailure),
        (status = 500, description = "Internal server error.", body = ResponseFailure),
    ),
)]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Validated(request): Validated<RequestProjectUpdate>,
) -> Result<Json<Envelope<Project>>, ApiError> {
    let id = request.params.id;
    let record = state
        .store
        .update(ProjectChange {
            id,
            name: request.params.name,
        })
        .await?
        .ok_or_else(|| {
            ApiError::warning("ProjectNotFound", format!("Project {} does not exist.", id))
        })?;

    tracing::info!(project_id = %record.id, "Project updated");

    Ok(Json(Envelope::success(record.into())))
}

/// 按 id 集合删除 Project
#[utoipa::path(
    post,
    path = "/api/v1/delete",
    tag = "Project",
    request_body = RequestProjectDelete,
    responses(
        (status = 200, description = "Deletion acknowledged.", body = Envelope<Empty>),
        (status = 400, description = "Bad request.", body = ResponseFailure),
        (status = 500, description = "Internal server error.", body = ResponseFailure),
    ),
)]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Validated(request): Validated<RequestProjectDelete>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    let removed = state.store.remove(&request.params).await?;

    tracing::info!(removed = removed, "Projects deleted");

    Ok(Json(Envelope::success(Empty {})))
}

/// 按时间窗口列出 Project，created 降序
#[utoipa::path(
    post,
    path = "/api/v1/list",
    tag = "Project",
    request_body = RequestProjectList,
    responses(
        (status = 200, description = "Projects in the window.", body = Envelope<Vec<Project>>),
        (status = 400, description = "Bad request.", body = ResponseFailure),
        (status = 500, description = "Internal server error.", body = ResponseFailure),
    ),
)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Validated(request): Validated<RequestProjectList>,
) -> Result<Json<Envelope<Vec<Project>>>, ApiError> {
    let records = state.store.list(request.params.into()).await?;

    Ok(Json(Envelope::success(
        records.into_iter().map(Project::from).collect(),
    )))
}
