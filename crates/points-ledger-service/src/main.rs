//! 积分账本服务
//!
//! 提供扫码打卡、答题、兑换、余额与历史查询的 REST API。

use std::time::Duration;

use engagement_shared::{config::AppConfig, database::Database, observability};
use points_ledger::{
    MIGRATOR, NotificationSender,
    http::{self, AppState},
    service::LedgerServices,
};
use tokio::net::TcpListener;
use tracing::info;

const SERVICE_NAME: &str = "points-ledger-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;

    let _guard = observability::init(&config.service_name, &config.observability).await?;

    info!(
        environment = %config.environment,
        "Starting {} on {}",
        SERVICE_NAME,
        config.server_addr()
    );

    let db = Database::connect(&config.database).await?;

    if config.database.run_migrations {
        db.run_migrations(&MIGRATOR).await?;
    }

    let services = LedgerServices::new(
        db.pool().clone(),
        &config.ledger,
        NotificationSender::log_only(),
    );
    info!(
        day_offset = %config.ledger.day_offset(),
        visit_scan_tag = %config.ledger.visit_scan_tag,
        "Ledger services initialized"
    );

    let app = http::router(
        AppState::new(db.clone(), services),
        Duration::from_secs(config.server.request_timeout_seconds),
    );

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 收到 SIGTERM 或 Ctrl+C 后停止接收新连接，等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
