//! Health Check Handler
//!
//! 纯文本响应，不走信封，也不经过校验/观测管道

/// 服务健康检查
#[utoipa::path(
    get,
    path = "/health_check",
    tag = "Misc",
    responses((status = 200, description = "Success operation.", body = String)),
)]
pub async fn health_check() -> &'static str {
    "200"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_body() {
        assert_eq!(health_check().await, "200");
    }
}
