//! 历史查询

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use crate::http::{
    error::ApiResult, extract::VisitorId, response::ApiResponse, state::AppState,
};
use crate::models::{AccrualHistoryEntry, RedemptionHistoryEntry, VisitHistoryEntry};

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/history/points
pub async fn points(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<AccrualHistoryEntry>>>> {
    let Query(query) = query?;
    let entries = state
        .services
        .history
        .points_history(visitor_id, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/v1/history/visits
pub async fn visits(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<VisitHistoryEntry>>>> {
    let Query(query) = query?;
    let entries = state
        .services
        .history
        .visit_history(visitor_id, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/v1/history/rewards
pub async fn rewards(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<Vec<RedemptionHistoryEntry>>>> {
    let Query(query) = query?;
    let entries = state
        .services
        .history
        .rewards_history(visitor_id, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}
