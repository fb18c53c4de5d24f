//! 积分入账记录器
//!
//! 向账本追加不可变的入账事件，并按来源保证幂等：
//! - 场馆打卡：同一访客同一场馆每个自然日一条
//! - 答题正确：同一访客同一题目一条
//!
//! 先查重再条件插入，查重负责给出快速结果，唯一索引负责兜住并发。

use std::time::Instant;

use chrono::{DateTime, FixedOffset, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use engagement_shared::config::LedgerConfig;
use engagement_shared::observability::metrics;
use engagement_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::{LedgerError, Result};
use crate::models::{AccrualEvent, AccrualSource, NewAccrualEvent, calendar_day};
use crate::notification::{LedgerEvent, NotificationSender};
use crate::repository::AccrualRepository;
use crate::service::dto::ScanAccrual;

pub struct EventRecorder {
    pool: PgPool,
    day_offset: FixedOffset,
    retry_policy: RetryPolicy,
    notifier: NotificationSender,
}

impl EventRecorder {
    pub fn new(pool: PgPool, config: &LedgerConfig, notifier: NotificationSender) -> Self {
        Self {
            pool,
            day_offset: config.day_offset(),
            retry_policy: RetryPolicy::single(config.conflict_retry_delay()),
            notifier,
        }
    }

    /// 记录一次场馆打卡入账
    ///
    /// 今日已打卡时返回 `DuplicateScan`
    #[instrument(skip_all, fields(visitor_id = %visitor_id, venue_id = %venue_id))]
    pub async fn record_venue_scan(
        &self,
        visitor_id: i64,
        venue_id: i64,
        points_configured: i32,
    ) -> Result<ScanAccrual> {
        let start = Instant::now();

        let result = retry_with_policy(
            &self.retry_policy,
            "record_venue_scan",
            LedgerError::is_retryable,
            || async {
                let occurred_at = Utc::now();
                let mut tx = self.pool.begin().await?;
                let event = Self::record_venue_scan_in_tx(
                    &mut tx,
                    visitor_id,
                    venue_id,
                    points_configured,
                    occurred_at,
                    self.day_offset,
                )
                .await?;
                tx.commit().await?;
                Ok::<_, LedgerError>(event)
            },
        )
        .await;

        metrics::record_operation_duration("record_venue_scan", start.elapsed().as_secs_f64());

        let event = result.inspect_err(|e| {
            metrics::record_accrual(AccrualSource::VenueScan.as_str(), &e.outcome_label());
        })?;
        metrics::record_accrual(AccrualSource::VenueScan.as_str(), "accepted");

        let visit_date = event
            .visit_date
            .unwrap_or_else(|| calendar_day(event.occurred_at, self.day_offset));

        self.notifier.notify(LedgerEvent::PointsAccrued {
            visitor_id,
            source: AccrualSource::VenueScan,
            reference_id: venue_id,
            points: i64::from(event.points),
        });

        Ok(ScanAccrual::from_event(&event, venue_id, visit_date))
    }

    /// 在调用方事务中记录场馆打卡入账
    ///
    /// 供扫码入口与到访记录在同一事务中组合使用
    pub async fn record_venue_scan_in_tx(
        tx: &mut PgConnection,
        visitor_id: i64,
        venue_id: i64,
        points: i32,
        occurred_at: DateTime<Utc>,
        day_offset: FixedOffset,
    ) -> Result<AccrualEvent> {
        ensure_non_negative(points)?;

        let event = NewAccrualEvent::venue_scan(visitor_id, venue_id, points, occurred_at, day_offset);
        let visit_date = calendar_day(occurred_at, day_offset);
        let duplicate = || LedgerError::DuplicateScan {
            venue_id,
            visit_date,
        };

        if AccrualRepository::find_venue_scan_in_tx(&mut *tx, visitor_id, venue_id, visit_date)
            .await?
            .is_some()
        {
            info!(visitor_id, venue_id, %visit_date, "今日已打卡，不重复入账");
            return Err(duplicate());
        }

        match AccrualRepository::insert_in_tx(&mut *tx, &event).await? {
            Some(inserted) => {
                info!(
                    visitor_id,
                    venue_id,
                    %visit_date,
                    points,
                    event_id = inserted.id,
                    "打卡积分已入账"
                );
                Ok(inserted)
            }
            None => {
                info!(visitor_id, venue_id, %visit_date, "并发打卡已被先到请求入账");
                Err(duplicate())
            }
        }
    }

    /// 在调用方事务中记录答题正确入账
    ///
    /// 仅由答题协调器在评分后调用；同一题目已入账时返回 `AlreadySubmitted`
    pub async fn record_quiz_correct_in_tx(
        tx: &mut PgConnection,
        visitor_id: i64,
        quiz_id: i64,
        points: i32,
        occurred_at: DateTime<Utc>,
    ) -> Result<AccrualEvent> {
        ensure_non_negative(points)?;

        let event = NewAccrualEvent::quiz_correct(visitor_id, quiz_id, points, occurred_at);

        AccrualRepository::insert_in_tx(tx, &event)
            .await?
            .ok_or(LedgerError::AlreadySubmitted { quiz_id })
    }
}

fn ensure_non_negative(points: i32) -> Result<()> {
    if points < 0 {
        return Err(LedgerError::Validation(format!(
            "入账积分不能为负数: {}",
            points
        )));
    }
    Ok(())
}
