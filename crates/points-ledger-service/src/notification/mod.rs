//! 账本事件通知
//!
//! 入账、兑换提交成功后通知下游（推送、站内信等由外部系统实现）。
//! 通知在事务提交之后异步发出，发送失败只记日志，不影响已提交的账本结果。

mod sender;
mod sink;
mod types;

pub use sender::NotificationSender;
pub use sink::{LogNotificationSink, NotificationSink};
pub use types::LedgerEvent;
