//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(service_name: &str, metrics_port: u16) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!(
        "ledger_accruals_total",
        "Accrual attempts by source and outcome"
    );
    metrics::describe_counter!(
        "ledger_redemptions_total",
        "Redemption attempts by outcome"
    );
    metrics::describe_counter!(
        "ledger_quiz_submissions_total",
        "Quiz submissions by mode and outcome"
    );
    metrics::describe_histogram!(
        "ledger_operation_duration_seconds",
        "Ledger operation duration in seconds"
    );
    metrics::describe_counter!(
        "ledger_storage_conflicts_total",
        "Write conflicts detected at commit time"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录积分入账尝试
#[inline]
pub fn record_accrual(source: &str, outcome: &str) {
    metrics::counter!(
        "ledger_accruals_total",
        "source" => source.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录兑换尝试
#[inline]
pub fn record_redemption(outcome: &str) {
    metrics::counter!("ledger_redemptions_total", "outcome" => outcome.to_string()).increment(1);
}

/// 记录答题提交
#[inline]
pub fn record_quiz_submission(mode: &str, outcome: &str) {
    metrics::counter!(
        "ledger_quiz_submissions_total",
        "mode" => mode.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录账本操作耗时
#[inline]
pub fn record_operation_duration(operation: &str, duration_secs: f64) {
    metrics::histogram!(
        "ledger_operation_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// 记录提交时检测到的写入冲突
#[inline]
pub fn record_storage_conflict(operation: &str) {
    metrics::counter!(
        "ledger_storage_conflicts_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 未初始化 recorder 时记录指标不应 panic
        record_http_request("GET", "/api/v1/balance", 200, 0.1);
        record_accrual("VENUE_SCAN", "accepted");
        record_redemption("insufficient_balance");
        record_quiz_submission("batch", "rejected");
        record_operation_duration("redeem", 0.02);
        record_storage_conflict("scan");
    }
}
