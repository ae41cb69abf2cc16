//! HTTP Error Handling
//!
//! 失败分类 → 状态码映射 → 统一失败信封
//!
//! 所有失败都在这里收口：校验失败、业务警告、未预期错误
//! 最终都变成一个结构稳定的失败信封，绝不向外层传播

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::backtrace::Backtrace;
use std::sync::Arc;

use super::dto::{Envelope, ResponseFailure};
use crate::application::ports::StoreError;

/// API 错误
///
/// 每个变体对应一种失败分类，`status()` 给出穷尽的状态码映射
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 请求体不是合法 JSON
    #[error("{0}")]
    Parse(String),

    /// 请求体超出大小上限
    #[error("Request body is too large.")]
    TooLarge,

    /// 请求体与声明的结构不匹配
    #[error("{0}")]
    Validation(String),

    /// 请求体同时匹配 union 中的多个结构
    #[error("Request matches several of the shapes in the union.")]
    AmbiguousUnion,

    /// 下游认证协作方传播的认证失败
    #[error("{0}")]
    Authentication(String),

    /// 业务警告：已处理的非致命状况，传输层仍按成功返回
    #[error("{message}")]
    Warning { kind: &'static str, message: String },

    /// 未预期的内部错误
    #[error("{message}")]
    Internal { kind: String, message: String },
}

impl ApiError {
    /// 构造内部错误，kind 固定为 InternalError
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            kind: "InternalError".to_string(),
            message: message.into(),
        }
    }

    /// 构造业务警告
    pub fn warning(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Warning {
            kind,
            message: message.into(),
        }
    }

    /// 请求体读取失败的分类：超限 → TooLarge，其余按解析失败处理
    pub fn from_read_error(err: axum::Error) -> Self {
        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        while let Some(inner) = source {
            if inner.is::<http_body_util::LengthLimitError>() {
                return Self::TooLarge;
            }
            source = inner.source();
        }
        Self::Parse(format!("Failed to read request body: {}", err))
    }

    /// 失败分类名，填入信封的 error_type 字段
    pub fn error_type(&self) -> &str {
        match self {
            ApiError::Parse(_) => "ParseError",
            ApiError::TooLarge => "PayloadTooLargeError",
            ApiError::Validation(_) => "ValidationError",
            ApiError::AmbiguousUnion => "AmbiguousUnionError",
            ApiError::Authentication(_) => "AuthenticationError",
            ApiError::Warning { kind, .. } => kind,
            ApiError::Internal { kind, .. } => kind,
        }
    }

    /// 分类 → 状态码的穷尽映射
    ///
    /// 业务警告映射为 200：传输层成功、业务信封失败
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Parse(_) => StatusCode::BAD_REQUEST,
            ApiError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::AmbiguousUnion => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Warning { .. } => StatusCode::OK,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let kind = match &err {
            StoreError::Database(_) => "DatabaseError",
            StoreError::Serialization(_) => "SerializationError",
        };
        Self::Internal {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }
}

/// 错误响应的旁路元数据
///
/// 挂在响应 extensions 上，供外层日志中间件生成 ErrorEvent，
/// 不参与响应体序列化
#[derive(Debug, Clone)]
pub struct ErrorMeta {
    pub status: StatusCode,
    pub envelope: ResponseFailure,
    pub backtrace: Option<Arc<str>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let envelope = Envelope::failure(self.error_type(), self.to_string());

        // 仅对未预期错误捕获调用栈
        let backtrace = match &self {
            ApiError::Internal { .. } => {
                Some(Arc::from(Backtrace::force_capture().to_string().as_str()))
            }
            _ => None,
        };

        match &self {
            ApiError::Internal { kind, message } => {
                tracing::error!(error_type = %kind, error = %message, "Request failed");
            }
            ApiError::Warning { kind, message } => {
                tracing::warn!(error_type = %kind, error = %message, "Business warning");
            }
            other => {
                tracing::warn!(
                    error_type = %other.error_type(),
                    error = %other,
                    "Request rejected"
                );
            }
        }

        let meta = ErrorMeta {
            status,
            envelope: envelope.clone(),
            backtrace,
        };

        let mut response = (status, Json(envelope)).into_response();
        response.extensions_mut().insert(meta);
        response
    }
}
