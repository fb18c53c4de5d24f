//! 奖品兑换

use axum::{
    Json,
    extract::{Path, State},
};

use crate::http::{
    error::ApiResult, extract::VisitorId, response::ApiResponse, state::AppState,
};
use crate::models::Reward;
use crate::service::RedemptionReceipt;

/// POST /api/v1/rewards/{reward_id}/redemption
pub async fn redeem(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
    Path(reward_id): Path<i64>,
) -> ApiResult<Json<ApiResponse<RedemptionReceipt>>> {
    let receipt = state
        .services
        .redemption
        .redeem(visitor_id, reward_id)
        .await?;

    Ok(Json(ApiResponse::success(receipt)))
}

/// GET /api/v1/rewards
pub async fn list_available(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
) -> ApiResult<Json<ApiResponse<Vec<Reward>>>> {
    let rewards = state.services.history.available_rewards(visitor_id).await?;
    Ok(Json(ApiResponse::success(rewards)))
}
