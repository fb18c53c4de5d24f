//! 请求提取器
//!
//! 访客身份由上游网关完成认证后通过 `x-visitor-id` 头传入，
//! 这里只做格式校验。

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;

pub const VISITOR_ID_HEADER: &str = "x-visitor-id";

/// 已认证的访客 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorId(pub i64);

impl<S> FromRequestParts<S> for VisitorId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(VISITOR_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(VisitorId)
            .ok_or(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<VisitorId, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(VISITOR_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        VisitorId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_visitor_id() {
        assert_eq!(extract(Some("42")).await.unwrap(), VisitorId(42));
    }

    #[tokio::test]
    async fn test_missing_or_invalid_visitor_id() {
        assert!(matches!(extract(None).await, Err(ApiError::Unauthorized)));
        assert!(matches!(extract(Some("abc")).await, Err(ApiError::Unauthorized)));
        assert!(matches!(extract(Some("0")).await, Err(ApiError::Unauthorized)));
        assert!(matches!(extract(Some("-7")).await, Err(ApiError::Unauthorized)));
    }
}
