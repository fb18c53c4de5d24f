//! 冲突重试执行器
//!
//! 账本写入遇到唯一约束或隔离级别冲突时，重新执行整个操作一次：
//! 第二次执行会看到对方已提交的结果，从而得出"已处理"类结论。
//! 业务结果（如重复打卡、余额不足）不重试，由调用方通过 `is_retryable` 判断。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大重试次数（不含首次执行）
    pub max_retries: u32,
    /// 每次重试前的固定等待
    pub delay: Duration,
}

impl RetryPolicy {
    /// 只重试一次
    pub fn single(delay: Duration) -> Self {
        Self {
            max_retries: 1,
            delay,
        }
    }

    /// attempt 为已失败次数
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// 按策略执行异步操作
///
/// 只有 `is_retryable` 返回 true 的错误才会触发重试
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt, "冲突重试后完成");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            return Err(err);
        }

        if !policy.should_retry(attempt) {
            warn!(
                operation = operation_name,
                attempt,
                error = %err,
                "冲突重试次数已用尽"
            );
            return Err(err);
        }

        warn!(
            operation = operation_name,
            delay_ms = policy.delay.as_millis() as u64,
            error = %err,
            "写入冲突，重新执行"
        );

        if !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Conflict,
        Duplicate,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn is_conflict(e: &TestError) -> bool {
        *e == TestError::Conflict
    }

    #[test]
    fn test_single_policy() {
        let policy = RetryPolicy::single(Duration::from_millis(20));
        assert!(policy.should_retry(0));
        assert!(!policy.should_retry(1));
    }

    #[tokio::test]
    async fn test_conflict_is_rederived_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        // 第一次冲突，第二次看到已提交结果，得出重复
        let result: Result<i32, _> = retry_with_policy(
            &RetryPolicy::single(Duration::from_millis(1)),
            "record",
            is_conflict,
            || {
                let counter = counter.clone();
                async move {
                    match counter.fetch_add(1, Ordering::SeqCst) {
                        0 => Err(TestError::Conflict),
                        _ => Err(TestError::Duplicate),
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Err(TestError::Duplicate));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_business_outcome_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<i32, _> = retry_with_policy(
            &RetryPolicy::single(Duration::from_millis(1)),
            "record",
            is_conflict,
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Duplicate)
                }
            },
        )
        .await;

        assert_eq!(result, Err(TestError::Duplicate));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_conflict_surfaces() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<i32, _> = retry_with_policy(
            &RetryPolicy::single(Duration::ZERO),
            "record",
            is_conflict,
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(TestError::Conflict)
                }
            },
        )
        .await;

        assert_eq!(result, Err(TestError::Conflict));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_success_after_conflict() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_policy(
            &RetryPolicy::single(Duration::from_millis(1)),
            "redeem",
            is_conflict,
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(TestError::Conflict)
                    } else {
                        Ok(7)
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Ok(7));
    }
}
