//! API Documentation - 自动生成的接口文档
//!
//! OpenAPI 描述由 handler 上的注解汇总而来，加新路由时
//! 记得在 [`ApiDoc`] 的 paths 里补一行。
//! `/doc` 返回 Swagger UI 页面，`/doc/openapi.json` 返回原始描述。

use axum::{response::Html, routing::get, Json, Router};
use utoipa::OpenApi;

use super::dto::{
    Empty, Envelope, ErrorResult, Project, ProjectCreate, ProjectListFilter, ProjectUpdate,
    RequestProjectCreate, RequestProjectDelete, RequestProjectList, RequestProjectRead,
    RequestProjectUpdate,
};
use super::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tabula",
        description = "Project CRUD service with a uniform response envelope.",
        version = "1.0.0",
    ),
    paths(
        handlers::project::create,
        handlers::project::read,
        handlers::project::update,
        handlers::project::delete,
        handlers::project::list,
        handlers::health::health_check,
    ),
    components(schemas(
        Envelope<Project>,
        Envelope<Vec<Project>>,
        Envelope<Empty>,
        Envelope<ErrorResult>,
        ErrorResult,
        Empty,
        Project,
        ProjectCreate,
        ProjectUpdate,
        ProjectListFilter,
        RequestProjectCreate,
        RequestProjectRead,
        RequestProjectUpdate,
        RequestProjectDelete,
        RequestProjectList,
    )),
    tags(
        (name = "Project", description = "Project CRUD operations."),
        (name = "Misc", description = "Service plumbing."),
    ),
)]
pub struct ApiDoc;

const SWAGGER_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Tabula API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            SwaggerUIBundle({
                url: "/doc/openapi.json",
                dom_id: "#swagger-ui",
            });
        };
    </script>
</body>
</html>
"##;

pub fn routes() -> Router {
    Router::new()
        .route("/doc", get(swagger_page))
        .route("/doc/openapi.json", get(openapi_spec))
}

async fn swagger_page() -> Html<&'static str> {
    Html(SWAGGER_PAGE)
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
