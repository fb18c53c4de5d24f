//! 积分入账仓储
//!
//! `accrual_events` 只追加。幂等依赖两个部分唯一索引：
//! - VENUE_SCAN: (visitor_id, venue_id, visit_date)
//! - QUIZ_CORRECT: (visitor_id, quiz_id)

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{AccrualEvent, AccrualGroupRow, AccrualHistoryEntry, NewAccrualEvent};

pub struct AccrualRepository {
    pool: PgPool,
}

impl AccrualRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 写入操作 ====================

    /// 条件插入入账事件
    ///
    /// 命中唯一索引时 `ON CONFLICT DO NOTHING` 不插入任何行，返回 None，
    /// 由调用方翻译为对应的"已处理"结果。
    /// 并发的同键插入会等待先到者提交后再判定，因此不会出现双写。
    pub async fn insert_in_tx(
        tx: &mut PgConnection,
        event: &NewAccrualEvent,
    ) -> Result<Option<AccrualEvent>> {
        let inserted = sqlx::query_as::<_, AccrualEvent>(
            r#"
            INSERT INTO accrual_events
                (visitor_id, source, venue_id, quiz_id, points, visit_date, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING
            RETURNING id, visitor_id, source, venue_id, quiz_id, points, visit_date, occurred_at
            "#,
        )
        .bind(event.visitor_id)
        .bind(event.source)
        .bind(event.venue_id)
        .bind(event.quiz_id)
        .bind(event.points)
        .bind(event.visit_date)
        .bind(event.occurred_at)
        .fetch_optional(tx)
        .await?;

        Ok(inserted)
    }

    // ==================== 查询操作 ====================

    /// 查找某访客某天在某场馆的打卡入账
    pub async fn find_venue_scan_in_tx(
        tx: &mut PgConnection,
        visitor_id: i64,
        venue_id: i64,
        visit_date: NaiveDate,
    ) -> Result<Option<AccrualEvent>> {
        let event = sqlx::query_as::<_, AccrualEvent>(
            r#"
            SELECT id, visitor_id, source, venue_id, quiz_id, points, visit_date, occurred_at
            FROM accrual_events
            WHERE visitor_id = $1 AND venue_id = $2 AND visit_date = $3
              AND source = 'VENUE_SCAN'
            "#,
        )
        .bind(visitor_id)
        .bind(venue_id)
        .bind(visit_date)
        .fetch_optional(tx)
        .await?;

        Ok(event)
    }

    /// 访客累计获得积分
    pub async fn sum_points_in_tx(tx: &mut PgConnection, visitor_id: i64) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(points), 0)::BIGINT FROM accrual_events WHERE visitor_id = $1",
        )
        .bind(visitor_id)
        .fetch_one(tx)
        .await?;

        Ok(total)
    }

    /// 按来源与场馆分组的入账汇总
    pub async fn breakdown_in_tx(
        tx: &mut PgConnection,
        visitor_id: i64,
    ) -> Result<Vec<AccrualGroupRow>> {
        let rows = sqlx::query_as::<_, AccrualGroupRow>(
            r#"
            SELECT a.source,
                   a.venue_id,
                   v.name AS venue_name,
                   COALESCE(SUM(a.points), 0)::BIGINT AS points,
                   COUNT(*) AS events
            FROM accrual_events a
            LEFT JOIN venues v ON v.id = a.venue_id
            WHERE a.visitor_id = $1
            GROUP BY a.source, a.venue_id, v.name
            "#,
        )
        .bind(visitor_id)
        .fetch_all(tx)
        .await?;

        Ok(rows)
    }

    /// 入账历史，按时间倒序
    pub async fn list_by_visitor(
        &self,
        visitor_id: i64,
        limit: i64,
    ) -> Result<Vec<AccrualHistoryEntry>> {
        let entries = sqlx::query_as::<_, AccrualHistoryEntry>(
            r#"
            SELECT a.id, a.source, a.venue_id, v.name AS venue_name,
                   a.quiz_id, q.question AS quiz_question,
                   a.points, a.occurred_at
            FROM accrual_events a
            LEFT JOIN venues v ON v.id = a.venue_id
            LEFT JOIN quizzes q ON q.id = a.quiz_id
            WHERE a.visitor_id = $1
            ORDER BY a.occurred_at DESC, a.id DESC
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
