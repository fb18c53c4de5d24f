//! 健康检查

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::http::state::AppState;

/// 存活探针
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "points-ledger-service"
    }))
}

/// 就绪探针：数据库可达才返回 200
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "database": "ok" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "就绪检查失败: 数据库不可达");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "database": "unavailable" })),
            )
        }
    }
}
