//! 场馆扫码入口
//!
//! 解码二维码 -> 校验场馆 -> 记录打卡入账 -> 写入到访记录。
//! 入账与到访记录在同一事务提交；到访记录只用于报表，余额只认账本。

use std::sync::Arc;
use std::time::Instant;

use chrono::{FixedOffset, Utc};
use sqlx::PgPool;
use tracing::{Span, error, info, instrument, warn};

use engagement_shared::config::LedgerConfig;
use engagement_shared::observability::metrics;
use engagement_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::{LedgerError, Result};
use crate::models::{AccrualSource, GeoPoint, NewAttendanceLog, Venue, decode_visit_scan};
use crate::notification::{LedgerEvent, NotificationSender};
use crate::repository::{AttendanceRepository, RegistryRepositoryTrait};
use crate::service::dto::{ScanAccrual, VenueScanResult};
use crate::service::event_recorder::EventRecorder;

pub struct ScanGate {
    pool: PgPool,
    registry: Arc<dyn RegistryRepositoryTrait>,
    visit_scan_tag: String,
    day_offset: FixedOffset,
    retry_policy: RetryPolicy,
    notifier: NotificationSender,
}

impl ScanGate {
    pub fn new(
        pool: PgPool,
        registry: Arc<dyn RegistryRepositoryTrait>,
        config: &LedgerConfig,
        notifier: NotificationSender,
    ) -> Self {
        Self {
            pool,
            registry,
            visit_scan_tag: config.visit_scan_tag.clone(),
            day_offset: config.day_offset(),
            retry_policy: RetryPolicy::single(config.conflict_retry_delay()),
            notifier,
        }
    }

    /// 处理一次扫码打卡
    #[instrument(
        skip_all,
        fields(
            visitor_id = %visitor_id,
            venue_id = tracing::field::Empty,
            scan_code = tracing::field::Empty,
            issued_at_ms = tracing::field::Empty,
        )
    )]
    pub async fn scan(
        &self,
        visitor_id: i64,
        payload: &str,
        location: GeoPoint,
    ) -> Result<VenueScanResult> {
        let start = Instant::now();
        let result = self.scan_inner(visitor_id, payload, location).await;
        metrics::record_operation_duration("venue_scan", start.elapsed().as_secs_f64());

        match &result {
            Ok(scan) => {
                metrics::record_accrual(AccrualSource::VenueScan.as_str(), "accepted");
                self.notifier.notify(LedgerEvent::PointsAccrued {
                    visitor_id,
                    source: AccrualSource::VenueScan,
                    reference_id: scan.accrual.venue_id,
                    points: scan.accrual.points_awarded,
                });
            }
            Err(e) => {
                metrics::record_accrual(AccrualSource::VenueScan.as_str(), &e.outcome_label());
                if e.is_expected_outcome() {
                    info!(code = e.error_code(), "扫码未入账: {}", e);
                } else if e.is_client_error() {
                    warn!(code = e.error_code(), "扫码被拒绝: {}", e);
                } else {
                    error!(code = e.error_code(), error = %e, "扫码处理失败");
                }
            }
        }

        result
    }

    async fn scan_inner(
        &self,
        visitor_id: i64,
        payload: &str,
        location: GeoPoint,
    ) -> Result<VenueScanResult> {
        let scan = decode_visit_scan(payload, &self.visit_scan_tag)?;

        let span = Span::current();
        span.record("venue_id", scan.venue_id);
        if let Some(code) = &scan.code {
            span.record("scan_code", code.as_str());
        }
        if let Some(issued_at_ms) = scan.issued_at_ms {
            span.record("issued_at_ms", issued_at_ms);
        }

        location.validate()?;

        let venue = self
            .registry
            .get_venue(scan.venue_id)
            .await?
            .filter(|venue| venue.active)
            .ok_or(LedgerError::VenueNotFound(scan.venue_id))?;

        retry_with_policy(
            &self.retry_policy,
            "venue_scan",
            LedgerError::is_retryable,
            || self.record_visit(visitor_id, &venue, location),
        )
        .await
    }

    async fn record_visit(
        &self,
        visitor_id: i64,
        venue: &Venue,
        location: GeoPoint,
    ) -> Result<VenueScanResult> {
        let occurred_at = Utc::now();
        let local = occurred_at.with_timezone(&self.day_offset);

        let mut tx = self.pool.begin().await?;

        let event = EventRecorder::record_venue_scan_in_tx(
            &mut tx,
            visitor_id,
            venue.id,
            venue.scan_points,
            occurred_at,
            self.day_offset,
        )
        .await?;

        let log = NewAttendanceLog {
            visitor_id,
            venue_id: venue.id,
            accrual_event_id: event.id,
            visit_date: local.date_naive(),
            visit_time: local.time(),
            points_awarded: event.points,
            location,
        };
        let attendance_log_id = AttendanceRepository::insert_in_tx(&mut tx, &log).await?;

        tx.commit().await?;

        Ok(VenueScanResult {
            accrual: ScanAccrual::from_event(&event, venue.id, log.visit_date),
            venue_name: venue.name.clone(),
            attendance_log_id,
        })
    }
}
