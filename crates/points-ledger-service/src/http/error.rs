//! HTTP 错误映射
//!
//! - 预期内结果（重复打卡、已答题、已兑换）：200，`success=false`
//! - 客户端错误：400 / 404 / 409 / 422
//! - 存储不可用：503；其他系统错误：500，只返回通用提示，详情记日志

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::error::LedgerError;

use super::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("缺少或无效的访客身份")]
    Unauthorized,

    #[error("请求格式错误: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Ledger(err) => ledger_status(err),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Ledger(err) => err.error_code(),
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::DuplicateScan { .. }
        | LedgerError::AlreadySubmitted { .. }
        | LedgerError::AlreadyRedeemed { .. } => StatusCode::OK,
        LedgerError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::RewardNotFound(_)
        | LedgerError::QuizNotFound(_)
        | LedgerError::VenueNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::InvalidScanFormat(_)
        | LedgerError::WrongScanType { .. }
        | LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::BatchRejected { .. } | LedgerError::StorageConflict(_) => StatusCode::CONFLICT,
        LedgerError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Database(_) | LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let (message, data) = match &self {
            Self::Ledger(LedgerError::BatchRejected {
                already_submitted,
                not_found,
            }) => (
                self.to_string(),
                Some(json!({
                    "alreadySubmitted": already_submitted,
                    "notFound": not_found,
                })),
            ),
            Self::Ledger(LedgerError::InsufficientBalance {
                required,
                available,
            }) => (
                self.to_string(),
                Some(json!({ "required": required, "available": available })),
            ),
            Self::Ledger(LedgerError::StorageUnavailable(e)) => {
                tracing::error!(error = %e, "存储不可用");
                ("服务暂不可用，请稍后重试".to_string(), None)
            }
            Self::Ledger(e @ (LedgerError::Database(_) | LedgerError::Internal(_))) => {
                tracing::error!(error = %e, "内部错误");
                ("服务内部错误，请稍后重试".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let mut body = ApiResponse::<serde_json::Value>::failure(code, message);
        if let Some(data) = data {
            body = body.with_data(data);
        }

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Ledger(LedgerError::Validation(errors.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let dup = ApiError::from(LedgerError::DuplicateScan {
            venue_id: 5,
            visit_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        });
        assert_eq!(dup.status_code(), StatusCode::OK);
        assert_eq!(
            ApiError::from(LedgerError::RewardNotFound(1)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(LedgerError::InsufficientBalance {
                required: 25,
                available: 5
            })
            .status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(LedgerError::StorageUnavailable("down".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expected_outcome_body() {
        let response = ApiError::from(LedgerError::AlreadyRedeemed { reward_id: 3 }).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "ALREADY_REDEEMED");
    }

    #[tokio::test]
    async fn test_batch_rejection_lists_ids() {
        let response = ApiError::from(LedgerError::BatchRejected {
            already_submitted: vec![2],
            not_found: vec![9],
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let json = body_json(response).await;
        assert_eq!(json["data"]["alreadySubmitted"], json!([2]));
        assert_eq!(json["data"]["notFound"], json!([9]));
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response =
            ApiError::from(LedgerError::Internal("secret stack".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert!(!json["message"].as_str().unwrap().contains("secret"));
    }
}
