//! 到访记录仓储
//!
//! 到访记录只用于报表展示，余额只认入账事件

use sqlx::{PgConnection, PgPool, Row};

use crate::error::Result;
use crate::models::{NewAttendanceLog, VisitHistoryEntry};

pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 写入到访记录，返回新记录 ID
    pub async fn insert_in_tx(tx: &mut PgConnection, log: &NewAttendanceLog) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO attendance_logs
                (visitor_id, venue_id, accrual_event_id, visit_date, visit_time,
                 points_awarded, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(log.visitor_id)
        .bind(log.venue_id)
        .bind(log.accrual_event_id)
        .bind(log.visit_date)
        .bind(log.visit_time)
        .bind(log.points_awarded)
        .bind(log.location.latitude)
        .bind(log.location.longitude)
        .fetch_one(tx)
        .await?;

        Ok(row.get("id"))
    }

    /// 到访历史，按时间倒序
    pub async fn list_by_visitor(
        &self,
        visitor_id: i64,
        limit: i64,
    ) -> Result<Vec<VisitHistoryEntry>> {
        let entries = sqlx::query_as::<_, VisitHistoryEntry>(
            r#"
            SELECT l.id, l.venue_id, v.name AS venue_name, l.visit_date, l.visit_time,
                   l.points_awarded, l.latitude, l.longitude, l.created_at
            FROM attendance_logs l
            JOIN venues v ON v.id = l.venue_id
            WHERE l.visitor_id = $1
            ORDER BY l.visit_date DESC, l.visit_time DESC, l.id DESC
            LIMIT $2
            "#,
        )
        .bind(visitor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
