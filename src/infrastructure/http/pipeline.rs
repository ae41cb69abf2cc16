//! Request Validation Pipeline - 请求校验管道
//!
//! 每条路由在注册时显式声明输入结构描述符（单一结构或 union），
//! 管道按描述符解析并校验请求体，把校验后的对象挂到请求上下文，
//! handler 通过 [`Validated`] 提取器消费。
//!
//! 不做任何运行时反射，也不重试：校验失败对当前请求是终态。

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

use super::error::ApiError;
use super::server::BODY_LIMIT;

/// 校验成功时产出的已构造对象
type BoxedShape = Arc<dyn Any + Send + Sync>;

/// 单个结构的校验描述符
///
/// `validate` 是具体类型的单态化函数指针，由 [`ShapeCheck::of`] 生成
#[derive(Clone, Copy)]
pub struct ShapeCheck {
    pub name: &'static str,
    validate: fn(&Value) -> Result<BoxedShape, String>,
}

impl ShapeCheck {
    /// 为类型 T 生成校验描述符
    pub fn of<T>(name: &'static str) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Self {
            name,
            validate: check::<T>,
        }
    }

    pub fn validate(&self, raw: &Value) -> Result<BoxedShape, String> {
        (self.validate)(raw)
    }
}

impl std::fmt::Debug for ShapeCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeCheck").field("name", &self.name).finish()
    }
}

fn check<T>(raw: &Value) -> Result<BoxedShape, String>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    serde_json::from_value::<T>(raw.clone())
        .map(|value| Arc::new(value) as BoxedShape)
        .map_err(|e| e.to_string())
}

/// handler 的输入结构声明
#[derive(Debug, Clone)]
pub enum InputShape {
    /// 无输入声明，跳过校验，请求体原样透传
    None,
    /// 单一结构
    Single(ShapeCheck),
    /// 封闭的候选结构集合，必须恰好匹配一个
    Union(Vec<ShapeCheck>),
}

impl InputShape {
    pub fn single<T>(name: &'static str) -> Self
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Self::Single(ShapeCheck::of::<T>(name))
    }

    pub fn union(alternatives: Vec<ShapeCheck>) -> Self {
        Self::Union(alternatives)
    }
}

/// union 匹配失败的分类结果
#[derive(Debug)]
pub enum UnionError {
    /// 所有候选都不匹配，携带最后一个校验错误
    NoMatch { last_error: String },
    /// 匹配了多个候选
    Ambiguous { matched: Vec<&'static str> },
}

/// 对封闭候选集合逐一尝试构造，要求恰好一个成功
///
/// 多于一个成功视为歧义并拒绝，而不是取第一个
pub fn match_union(
    raw: &Value,
    alternatives: &[ShapeCheck],
) -> Result<(&'static str, BoxedShape), UnionError> {
    let mut matched: Vec<(&'static str, BoxedShape)> = Vec::new();
    let mut last_error = String::new();

    for alternative in alternatives {
        match alternative.validate(raw) {
            Ok(value) => matched.push((alternative.name, value)),
            Err(e) => last_error = e,
        }
    }

    match matched.len() {
        0 => Err(UnionError::NoMatch { last_error }),
        1 => Ok(matched.remove(0)),
        _ => Err(UnionError::Ambiguous {
            matched: matched.into_iter().map(|(name, _)| name).collect(),
        }),
    }
}

/// 校验通过后挂到请求上下文的对象
///
/// 每个请求至多一个，创建后不再修改
#[derive(Clone)]
pub struct ValidatedInput {
    /// 实际匹配到的结构名（union 时为命中的候选）
    pub shape: &'static str,
    value: BoxedShape,
}

impl ValidatedInput {
    pub fn downcast<T: Clone + 'static>(&self) -> Option<T> {
        self.value.downcast_ref::<T>().cloned()
    }
}

/// 路由注册辅助：把输入结构描述符与 handler 绑定在同一条路由上
///
/// ```ignore
/// .route("/create", with_shape(
///     InputShape::single::<RequestProjectCreate>("RequestProjectCreate"),
///     post(project::create),
/// ))
/// ```
pub fn with_shape<S>(shape: InputShape, method_router: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    method_router.layer(middleware::from_fn(move |request: Request, next: Next| {
        let shape = shape.clone();
        async move { validate_body(shape, request, next).await }
    }))
}

/// 管道主体：解析请求体 → 按描述符校验 → 挂载 → 调用 handler
async fn validate_body(shape: InputShape, request: Request, next: Next) -> Response {
    let shape = match shape {
        InputShape::None => return next.run(request).await,
        other => other,
    };

    let (mut parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(e) => return ApiError::from_read_error(e).into_response(),
    };

    let raw: Value = match serde_json::from_slice(&bytes) {
        Ok(raw) => raw,
        Err(e) => return ApiError::Parse(e.to_string()).into_response(),
    };

    let validated = match &shape {
        InputShape::Single(check) => match check.validate(&raw) {
            Ok(value) => ValidatedInput {
                shape: check.name,
                value,
            },
            Err(e) => return ApiError::Validation(e).into_response(),
        },
        InputShape::Union(alternatives) => match match_union(&raw, alternatives) {
            Ok((name, value)) => ValidatedInput { shape: name, value },
            Err(UnionError::NoMatch { last_error }) => {
                return ApiError::Validation(last_error).into_response()
            }
            Err(UnionError::Ambiguous { .. }) => {
                return ApiError::AmbiguousUnion.into_response()
            }
        },
        InputShape::None => unreachable!("handled above"),
    };

    parts.extensions.insert(validated);

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// 校验结果提取器
///
/// 从请求上下文取出管道挂载的对象并还原具体类型。
/// 路由未注册对应描述符时视为内部错误（500），与声明缺失的语义一致。
pub struct Validated<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Validated<T>
where
    S: Send + Sync,
    T: Clone + Send + Sync + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let input = parts
            .extensions
            .get::<ValidatedInput>()
            .ok_or_else(|| ApiError::internal("No validated input attached to the request."))?;

        input
            .downcast::<T>()
            .map(Validated)
            .ok_or_else(|| {
                ApiError::internal("Validated input does not match the handler's declared shape.")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::dto::{Envelope, ResponseFailure};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde::Deserialize;
    use serde_json::json;
    use tower::util::ServiceExt;

    #[derive(Debug, Clone, Deserialize)]
    struct ByName {
        name: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct ById {
        id: u64,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct Loose {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        id: Option<u64>,
    }

    #[test]
    fn test_shape_check_accepts_matching_body() {
        let check = ShapeCheck::of::<ByName>("ByName");
        let value = check.validate(&json!({"name": "Alpha"})).unwrap();
        assert_eq!(value.downcast_ref::<ByName>().unwrap().name, "Alpha");
    }

    #[test]
    fn test_shape_check_reports_missing_field() {
        let check = ShapeCheck::of::<ByName>("ByName");
        let err = check.validate(&json!({})).unwrap_err();
        assert!(err.contains("missing field"), "unexpected error: {err}");
    }

    #[test]
    fn test_union_exactly_one_match() {
        let alternatives = [ShapeCheck::of::<ByName>("ByName"), ShapeCheck::of::<ById>("ById")];
        let (name, value) = match_union(&json!({"id": 7}), &alternatives).unwrap();
        assert_eq!(name, "ById");
        assert_eq!(value.downcast_ref::<ById>().unwrap().id, 7);
    }

    #[test]
    fn test_union_no_match_reports_last_error() {
        let alternatives = [ShapeCheck::of::<ByName>("ByName"), ShapeCheck::of::<ById>("ById")];
        match match_union(&json!({"other": true}), &alternatives) {
            Err(UnionError::NoMatch { last_error }) => {
                assert!(last_error.contains("missing field"), "got: {last_error}");
            }
            other => panic!("expected NoMatch, got {:?}", other.map(|(n, _)| n)),
        }
    }

    #[test]
    fn test_union_ambiguous_match_is_rejected() {
        let alternatives = [ShapeCheck::of::<ByName>("ByName"), ShapeCheck::of::<Loose>("Loose")];
        match match_union(&json!({"name": "Alpha"}), &alternatives) {
            Err(UnionError::Ambiguous { matched }) => {
                assert_eq!(matched, vec!["ByName", "Loose"]);
            }
            other => panic!("expected Ambiguous, got {:?}", other.map(|(n, _)| n)),
        }
    }

    // ------------------------------------------------------------------
    // 管道级测试：路由 + 中间件 + 提取器
    // ------------------------------------------------------------------

    async fn by_name(Validated(input): Validated<ByName>) -> Json<Envelope<String>> {
        Json(Envelope::success(input.name))
    }

    async fn bare() -> Json<Envelope<&'static str>> {
        Json(Envelope::success("untouched"))
    }

    // union 路由读取原始上下文对象，按命中的结构名分派
    async fn either(
        axum::Extension(input): axum::Extension<ValidatedInput>,
    ) -> Json<Envelope<&'static str>> {
        Json(Envelope::success(input.shape))
    }

    fn test_router() -> Router {
        Router::new()
            .route(
                "/single",
                with_shape(InputShape::single::<ByName>("ByName"), post(by_name)),
            )
            .route("/bare", with_shape(InputShape::None, post(bare)))
            .route(
                "/union",
                with_shape(
                    InputShape::union(vec![
                        ShapeCheck::of::<ByName>("ByName"),
                        ShapeCheck::of::<ById>("ById"),
                    ]),
                    post(either),
                ),
            )
            .route(
                "/ambiguous",
                with_shape(
                    InputShape::union(vec![
                        ShapeCheck::of::<ByName>("ByName"),
                        ShapeCheck::of::<Loose>("Loose"),
                    ]),
                    post(either),
                ),
            )
    }

    async fn send(router: Router, path: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn failure(bytes: &[u8]) -> ResponseFailure {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_single_shape_happy_path() {
        let (status, bytes) = send(test_router(), "/single", r#"{"name": "Alpha"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let envelope: Envelope<String> = serde_json::from_slice(&bytes).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.result, "Alpha");
    }

    #[tokio::test]
    async fn test_missing_required_field_is_bad_request() {
        let (status, bytes) = send(test_router(), "/single", r#"{"other": 1}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let envelope = failure(&bytes);
        assert_eq!(envelope.result.error_type, "ValidationError");
        assert!(envelope.result.error_message.contains("missing field"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        let (status, bytes) = send(test_router(), "/single", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(failure(&bytes).result.error_type, "ParseError");
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let body = format!(r#"{{"name": "{}"}}"#, "a".repeat(BODY_LIMIT + 1));
        let (status, bytes) = send(test_router(), "/single", &body).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(failure(&bytes).result.error_type, "PayloadTooLargeError");
    }

    #[tokio::test]
    async fn test_no_shape_skips_body_parsing() {
        // 无声明的 handler：哪怕请求体不是 JSON 也不做解析
        let (status, bytes) = send(test_router(), "/bare", "{not json").await;
        assert_eq!(status, StatusCode::OK);
        let envelope: Envelope<String> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope.result, "untouched");
    }

    #[tokio::test]
    async fn test_union_single_match_succeeds() {
        let (status, bytes) = send(test_router(), "/union", r#"{"id": 3}"#).await;
        assert_eq!(status, StatusCode::OK);
        let envelope: Envelope<String> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(envelope.result, "ById");
    }

    #[tokio::test]
    async fn test_union_no_match_is_validation_error() {
        let (status, bytes) = send(test_router(), "/union", r#"{"other": true}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(failure(&bytes).result.error_type, "ValidationError");
    }

    #[tokio::test]
    async fn test_union_ambiguity_is_rejected() {
        let (status, bytes) = send(test_router(), "/ambiguous", r#"{"name": "Alpha"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let envelope = failure(&bytes);
        assert_eq!(envelope.result.error_type, "AmbiguousUnionError");
        assert!(envelope.result.error_message.contains("several"));
    }

    #[tokio::test]
    async fn test_missing_registration_is_internal_error() {
        // handler 声明了 Validated<T> 但路由未注册描述符
        let router = Router::new().route("/broken", post(by_name));
        let (status, bytes) = send(router, "/broken", r#"{"name": "Alpha"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failure(&bytes).result.error_type, "InternalError");
    }
}
