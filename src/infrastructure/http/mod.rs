//! HTTP Layer - RESTful API
//!
//! 校验管道 → handler → 信封响应，观测中间件贯穿 `/api/v1`

pub mod docs;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use pipeline::{InputShape, ShapeCheck, Validated};
pub use routes::create_router;
pub use server::{HttpServer, ServerConfig, BODY_LIMIT};
pub use state::AppState;
