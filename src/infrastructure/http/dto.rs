//! Data Transfer Objects
//!
//! 统一响应信封 + Project 请求/响应结构
//!
//! 时间字段序列化约定：UTC、以 Z 结尾、不带亚秒精度

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::ports::ProjectRecord;

/// 时间字段序列化格式：`2024-01-02T03:04:05Z`
pub mod utc_seconds {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// 解析 RFC 3339 时间；无时区后缀时按 UTC 处理
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }

        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid datetime {:?}: {}", raw, e))
    }
}

/// `Option<DateTime<Utc>>` 版本的 [`utc_seconds`]
pub mod utc_seconds_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => super::utc_seconds::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| super::utc_seconds::parse(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

// ============================================================================
// 统一响应信封
// ============================================================================

/// 统一响应信封
///
/// 成功时 `success = true`，`result` 为业务数据；
/// 失败时 `success = false`，`result` 为 [`ErrorResult`]。
/// 通过构造函数保证 success 标志与 result 形状一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    pub result: T,
}

impl<T> Envelope<T> {
    /// 成功响应
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

/// 错误详情
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResult {
    pub error_type: String,
    pub error_message: String,
}

/// 失败信封
pub type ResponseFailure = Envelope<ErrorResult>;

impl Envelope<ErrorResult> {
    /// 失败响应
    pub fn failure(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: ErrorResult {
                error_type: error_type.into(),
                error_message: error_message.into(),
            },
        }
    }
}

/// 空结果，序列化为 `{}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Empty {}

// ============================================================================
// Project DTOs
// ============================================================================

/// Project 响应结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "utc_seconds")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "utc_seconds_opt")]
    pub updated: Option<DateTime<Utc>>,
}

impl From<ProjectRecord> for Project {
    fn from(record: ProjectRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            created: record.created,
            updated: record.updated,
        }
    }
}

/// 创建请求参数
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProjectCreate {
    pub name: String,
}

/// 更新请求参数
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProjectUpdate {
    pub id: Uuid,
    pub name: String,
}

/// 列表过滤参数，时间比较均为严格大于/小于
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProjectListFilter {
    #[serde(default, with = "utc_seconds_opt")]
    pub created_gt: Option<DateTime<Utc>>,
    #[serde(default, with = "utc_seconds_opt")]
    pub created_lt: Option<DateTime<Utc>>,
    #[serde(default, with = "utc_seconds_opt")]
    pub updated_gt: Option<DateTime<Utc>>,
    #[serde(default, with = "utc_seconds_opt")]
    pub updated_lt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequestProjectCreate {
    pub params: ProjectCreate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequestProjectRead {
    pub params: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequestProjectUpdate {
    pub params: ProjectUpdate,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequestProjectDelete {
    pub params: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RequestProjectList {
    pub params: ProjectListFilter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Alpha".to_string(),
            created: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            updated: None,
        }
    }

    #[test]
    fn test_success_envelope_shape() {
        let envelope = Envelope::success(sample_project());
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["result"]["name"], "Alpha");
        assert_eq!(json["result"]["created"], "2024-01-02T03:04:05Z");
        assert!(json["result"]["updated"].is_null());
    }

    #[test]
    fn test_failure_envelope_shape() {
        let envelope = Envelope::failure("BadRequestError", "missing field `name`");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["result"]["error_type"], "BadRequestError");
        assert_eq!(json["result"]["error_message"], "missing field `name`");
    }

    #[test]
    fn test_envelope_round_trip() {
        let envelope = Envelope::success(sample_project());
        let text = serde_json::to_string(&envelope).unwrap();
        let parsed: Envelope<Project> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, envelope);

        let failure = Envelope::failure("ValidationError", "bad shape");
        let text = serde_json::to_string(&failure).unwrap();
        let parsed: ResponseFailure = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, failure);
    }

    #[test]
    fn test_datetime_drops_subsecond_precision() {
        let project = Project {
            created: Utc
                .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
                .unwrap()
                .checked_add_signed(chrono::Duration::milliseconds(987))
                .unwrap(),
            ..sample_project()
        };
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["created"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_datetime_parse_accepts_naive_utc() {
        let parsed = utc_seconds::parse("2024-01-02T03:04:05").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn test_empty_result_serializes_to_object() {
        let envelope = Envelope::success(Empty {});
        let json = serde_json::to_string(&envelope).unwrap();
        assert_eq!(json, r#"{"success":true,"result":{}}"#);
    }

    #[test]
    fn test_list_filter_accepts_partial_fields() {
        let raw = r#"{"params": {"created_gt": "2024-01-01T00:00:00Z"}}"#;
        let request: RequestProjectList = serde_json::from_str(raw).unwrap();
        assert!(request.params.created_gt.is_some());
        assert!(request.params.updated_lt.is_none());
    }
}
