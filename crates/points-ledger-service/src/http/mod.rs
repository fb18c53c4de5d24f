//! HTTP 接入层
//!
//! 只负责身份提取、请求校验和错误映射，业务规则全部在服务层

pub mod error;
pub mod extract;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::{Router, http::StatusCode, middleware, routing::get};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use engagement_shared::observability::middleware as obs_middleware;

pub use error::{ApiError, ApiResult};
pub use extract::VisitorId;
pub use response::ApiResponse;
pub use state::AppState;

/// 构建完整路由
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", routes::api_routes())
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
