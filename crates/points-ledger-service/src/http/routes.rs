//! 路由配置
//!
//! 所有业务端点挂在 `/api/v1` 下，访客身份通过 `x-visitor-id` 头传入

use axum::{
    Router,
    routing::{get, post},
};

use super::{handlers, state::AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/scans", post(handlers::scan::scan))
        // 答题
        .route("/quizzes", get(handlers::quiz::list_available))
        .route(
            "/quizzes/{quiz_id}/submission",
            post(handlers::quiz::submit_quiz),
        )
        .route(
            "/quizzes/submissions",
            post(handlers::quiz::submit_quizzes),
        )
        // 兑换
        .route("/rewards", get(handlers::redemption::list_available))
        .route(
            "/rewards/{reward_id}/redemption",
            post(handlers::redemption::redeem),
        )
        // 余额
        .route("/balance", get(handlers::balance::get_balance))
        .route("/balance/breakdown", get(handlers::balance::get_breakdown))
        // 历史
        .route("/history/points", get(handlers::history::points))
        .route("/history/visits", get(handlers::history::visits))
        .route("/history/rewards", get(handlers::history::rewards))
}
