//! 通知投递接口

use async_trait::async_trait;
use tracing::info;

use super::types::LedgerEvent;
use crate::error::Result;

/// 通知投递 trait
///
/// 由外部通知层实现（推送、短信等），实现应当可并发调用
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// 投递名称（用于日志）
    fn name(&self) -> &str;

    async fn deliver(&self, event: &LedgerEvent) -> Result<()>;
}

/// 默认实现：只写结构化日志
#[derive(Debug, Default, Clone)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, event: &LedgerEvent) -> Result<()> {
        info!(
            visitor_id = event.visitor_id(),
            event_type = event.kind(),
            event = ?event,
            "账本事件通知"
        );
        Ok(())
    }
}
