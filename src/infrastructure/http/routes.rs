//! HTTP Routes - 路由注册
//!
//! `/api/v1` 下的每条路由在这里声明自己的输入结构描述符，
//! 校验管道与观测中间件只覆盖这一段；`/health_check` 和文档页
//! 挂在外层，保持纯透传。

use axum::{middleware, routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use super::docs;
use super::dto::{
    RequestProjectCreate, RequestProjectDelete, RequestProjectList, RequestProjectRead,
    RequestProjectUpdate,
};
use super::handlers::{self, project};
use super::middleware::{observe, panic_response};
use super::pipeline::{with_shape, InputShape};
use super::state::AppState;

/// 组装完整路由表
pub fn create_router(state: Arc<AppState>, docs_enabled: bool) -> Router {
    let api_v1 = api_v1_routes()
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state.clone(), observe))
        .with_state(state);

    let router = Router::new()
        .nest("/api/v1", api_v1)
        .route("/health_check", get(handlers::health_check));

    if docs_enabled {
        router.merge(docs::routes())
    } else {
        router
    }
}

/// 业务路由与输入结构声明，一条路由一行
fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/create",
            with_shape(
                InputShape::single::<RequestProjectCreate>("RequestProjectCreate"),
                post(project::create),
            ),
        )
        .route(
            "/read",
            with_shape(
                InputShape::single::<RequestProjectRead>("RequestProjectRead"),
                post(project::read),
            ),
        )
        .route(
            "/update",
            with_shape(
                InputShape::single::<RequestProjectUpdate>("RequestProjectUpdate"),
                post(project::update),
            ),
        )
        .route(
            "/delete",
            with_shape(
                InputShape::single::<RequestProjectDelete>("RequestProjectDelete"),
                post(project::delete),
            ),
        )
        .route(
            "/list",
            with_shape(
                InputShape::single::<RequestProjectList>("RequestProjectList"),
                post(project::list),
            ),
        )
}
