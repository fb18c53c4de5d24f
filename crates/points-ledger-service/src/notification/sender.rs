//! 通知发送器
//!
//! 可注入到各个账本服务中，负责把事件异步交给投递实现

use std::sync::Arc;

use tracing::{debug, warn};

use super::sink::{LogNotificationSink, NotificationSink};
use super::types::LedgerEvent;

/// 通知发送器
#[derive(Clone)]
pub struct NotificationSender {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationSender {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// 只写日志的发送器
    pub fn log_only() -> Self {
        Self::new(Arc::new(LogNotificationSink))
    }

    /// 异步发送通知（fire-and-forget）
    ///
    /// 必须在事务提交之后调用
    pub fn notify(&self, event: LedgerEvent) {
        let sink = self.sink.clone();

        tokio::spawn(async move {
            match sink.deliver(&event).await {
                Ok(()) => debug!(
                    sink = sink.name(),
                    visitor_id = event.visitor_id(),
                    event_type = event.kind(),
                    "通知已投递"
                ),
                Err(e) => warn!(
                    sink = sink.name(),
                    visitor_id = event.visitor_id(),
                    event_type = event.kind(),
                    error = %e,
                    "通知投递失败"
                ),
            }
        });
    }
}

impl Default for NotificationSender {
    fn default() -> Self {
        Self::log_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::notification::sink::MockNotificationSink;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn redeemed() -> LedgerEvent {
        LedgerEvent::RewardRedeemed {
            visitor_id: 7,
            reward_id: 3,
            points_spent: 25,
        }
    }

    #[tokio::test]
    async fn test_notify_delivers_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut sink = MockNotificationSink::new();
        sink.expect_name().return_const("mock".to_string());
        sink.expect_deliver().times(1).returning(move |event| {
            let _ = tx.send(event.clone());
            Ok(())
        });

        let sender = NotificationSender::new(Arc::new(sink));
        sender.notify(redeemed());

        let delivered = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered, redeemed());
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_panic() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut sink = MockNotificationSink::new();
        sink.expect_name().return_const("mock".to_string());
        sink.expect_deliver().times(1).returning(move |_| {
            let _ = tx.send(());
            Err(LedgerError::Internal("push gateway down".to_string()))
        });

        let sender = NotificationSender::new(Arc::new(sink));
        sender.notify(redeemed());

        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_log_only_sender() {
        let sender = NotificationSender::default();
        sender.notify(redeemed());
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
