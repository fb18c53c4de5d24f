//! 兑换记录仓储
//!
//! `redemptions` 在 (visitor_id, reward_id) 上唯一

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{RedemptionHistoryEntry, RedemptionRecord};

pub struct RedemptionRepository {
    pool: PgPool,
}

impl RedemptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 对访客加事务级咨询锁
    ///
    /// 同一访客的兑换在"查重 -> 算余额 -> 写入"期间串行执行，锁随事务结束释放
    pub async fn lock_visitor_in_tx(tx: &mut PgConnection, visitor_id: i64) -> Result<()> {
        sqlx::query(
            "SELECT pg_advisory_xact_lock(hashtextextended('points_ledger.visitor:' || $1::text, 0))",
        )
        .bind(visitor_id)
        .execute(tx)
        .await?;

        Ok(())
    }

    pub async fn find_in_tx(
        tx: &mut PgConnection,
        visitor_id: i64,
        reward_id: i64,
    ) -> Result<Option<RedemptionRecord>> {
        let record = sqlx::query_as::<_, RedemptionRecord>(
            r#"
            SELECT id, visitor_id, reward_id, points_spent, redeemed_at
            FROM redemptions
            WHERE visitor_id = $1 AND reward_id = $2
            "#,
        )
        .bind(visitor_id)
        .bind(reward_id)
        .fetch_optional(tx)
        .await?;

        Ok(record)
    }

    /// 条件插入兑换记录，已兑换过时返回 None
    pub async fn insert_in_tx(
        tx: &mut PgConnection,
        visitor_id: i64,
        reward_id: i64,
        points_spent: i32,
        redeemed_at: DateTime<Utc>,
    ) -> Result<Option<RedemptionRecord>> {
        let record = sqlx::query_as::<_, RedemptionRecord>(
            r#"
            INSERT INTO redemptions (visitor_id, reward_id, points_spent, redeemed_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (visitor_id, reward_id) DO NOTHING
            RETURNING id, visitor_id, reward_id, points_spent, redeemed_at
            "#,
        )
        .bind(visitor_id)
        .bind(reward_id)
        .bind(points_spent)
        .bind(redeemed_at)
        .fetch_optional(tx)
        .await?;

        Ok(record)
    }

    /// 访客累计兑换消耗积分
    pub async fn sum_spent_in_tx(tx: &mut PgConnection, visitor_id: i64) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(points_spent), 0)::BIGINT FROM redemptions WHERE visitor_id = $1",
        )
        .bind(visitor_id)
        .fetch_one(tx)
        .await?;

        Ok(total)
    }

    /// 访客已兑换过的奖品 ID
    pub async fn list_redeemed_reward_ids(&self, visitor_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT reward_id FROM redemptions WHERE visitor_id = $1 ORDER BY reward_id ASC",
        )
        .bind(visitor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// 兑换历史，按时间倒序
    pub async fn list_by_visitor(
        &self,
        visitor_id: i64,
        limit: i64,
    ) -> Result<Vec<RedemptionHistoryEntry>> {
        let entries = sqlx::query_as::<_, RedemptionHistoryEntry>(
            r#"
            SELECT r.id, r.reward_id, w.title AS reward_title, r.points_spent, r.redeemed_at
            FROM redemptions r
            JOIN rewards w ON w.id = r.reward_id
            WHERE r.visitor_id = $1
            ORDER BY r.redeemed_at DESC, r.id DESC
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
