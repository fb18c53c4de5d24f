//! 扫码打卡

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use validator::Validate;

use crate::http::{
    error::ApiResult, extract::VisitorId, response::ApiResponse, state::AppState,
};
use crate::models::GeoPoint;
use crate::service::VenueScanResult;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// 二维码原始内容
    #[validate(length(min = 1, max = 2048))]
    pub payload: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

/// POST /api/v1/scans
pub async fn scan(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<VenueScanResult>>> {
    let Json(req) = body?;
    req.validate()?;

    let result = state
        .services
        .scan
        .scan(
            visitor_id,
            &req.payload,
            GeoPoint::new(req.latitude, req.longitude),
        )
        .await?;

    Ok(Json(ApiResponse::success(result)))
}
