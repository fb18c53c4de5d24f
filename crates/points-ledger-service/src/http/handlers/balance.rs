//! 余额查询

use axum::{Json, extract::State};
use serde::Serialize;

use crate::http::{
    error::ApiResult, extract::VisitorId, response::ApiResponse, state::AppState,
};
use crate::models::{Balance, BalanceBreakdown};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub visitor_id: i64,
    pub accrued: i64,
    pub spent: i64,
    pub available: i64,
}

impl BalanceResponse {
    fn new(visitor_id: i64, balance: Balance) -> Self {
        Self {
            visitor_id,
            accrued: balance.accrued,
            spent: balance.spent,
            available: balance.available(),
        }
    }
}

/// GET /api/v1/balance
pub async fn get_balance(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
) -> ApiResult<Json<ApiResponse<BalanceResponse>>> {
    let balance = state.services.balance.get_balance(visitor_id).await?;
    Ok(Json(ApiResponse::success(BalanceResponse::new(
        visitor_id, balance,
    ))))
}

/// GET /api/v1/balance/breakdown
pub async fn get_breakdown(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
) -> ApiResult<Json<ApiResponse<BalanceBreakdown>>> {
    let breakdown = state
        .services
        .balance
        .get_balance_breakdown(visitor_id)
        .await?;
    Ok(Json(ApiResponse::success(breakdown)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_response_available() {
        let resp = BalanceResponse::new(7, Balance::new(30, 25));
        assert_eq!(resp.available, 5);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["visitorId"], 7);
        assert_eq!(json["available"], 5);
    }
}
