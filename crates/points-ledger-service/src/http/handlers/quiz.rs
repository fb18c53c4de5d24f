//! 答题

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;

use crate::http::{
    error::ApiResult, extract::VisitorId, response::ApiResponse, state::AppState,
};
use crate::models::{QuizAnswer, QuizView};
use crate::service::{BatchQuizResult, QuizResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub selected_option: i32,
}

/// 批量提交，条数与选项范围由服务层统一校验
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSubmitRequest {
    pub answers: Vec<QuizAnswer>,
}

/// POST /api/v1/quizzes/{quiz_id}/submission
pub async fn submit_quiz(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
    Path(quiz_id): Path<i64>,
    body: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<QuizResult>>> {
    let Json(req) = body?;

    let result = state
        .services
        .quiz
        .submit_quiz(visitor_id, quiz_id, req.selected_option)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// POST /api/v1/quizzes/submissions
pub async fn submit_quizzes(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
    body: Result<Json<BatchSubmitRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<BatchQuizResult>>> {
    let Json(req) = body?;

    let result = state
        .services
        .quiz
        .submit_quizzes(visitor_id, &req.answers)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /api/v1/quizzes
///
/// 访客尚未作答的题目，不含标准答案
pub async fn list_available(
    State(state): State<AppState>,
    VisitorId(visitor_id): VisitorId,
) -> ApiResult<Json<ApiResponse<Vec<QuizView>>>> {
    let quizzes = state.services.history.available_quizzes(visitor_id).await?;
    Ok(Json(ApiResponse::success(quizzes)))
}
