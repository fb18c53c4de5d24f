//! 余额计算服务
//!
//! 余额 = 全部入账积分 - 全部兑换消耗，每次读取时现算，不落库也不缓存。
//! 多条聚合语句放在同一个只读快照事务里执行，保证彼此一致。

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, error, instrument};

use crate::error::Result;
use crate::models::{Balance, BalanceBreakdown};
use crate::repository::{AccrualRepository, RedemptionRepository};

pub struct BalanceService {
    pool: PgPool,
}

impl BalanceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 查询访客当前可用余额
    #[instrument(skip_all, fields(visitor_id = %visitor_id))]
    pub async fn get_balance(&self, visitor_id: i64) -> Result<Balance> {
        let mut tx = self.begin_snapshot().await?;
        let balance = Self::get_balance_in_tx(&mut tx, visitor_id).await?;
        tx.commit().await?;

        debug!(
            accrued = balance.accrued,
            spent = balance.spent,
            available = balance.available(),
            "余额已计算"
        );
        Ok(balance)
    }

    /// 在调用方事务中计算余额
    ///
    /// 兑换闸门在持有访客锁的同一事务内调用，判定与写入看到的是同一份账本
    pub async fn get_balance_in_tx(tx: &mut PgConnection, visitor_id: i64) -> Result<Balance> {
        let accrued = AccrualRepository::sum_points_in_tx(&mut *tx, visitor_id).await?;
        let spent = RedemptionRepository::sum_spent_in_tx(&mut *tx, visitor_id).await?;

        let balance = Balance::new(accrued, spent);
        if balance.available() < 0 {
            error!(visitor_id, accrued, spent, "账本余额为负，兑换记录与入账不一致");
        }
        Ok(balance)
    }

    /// 按来源、按场馆分组的余额明细
    #[instrument(skip_all, fields(visitor_id = %visitor_id))]
    pub async fn get_balance_breakdown(&self, visitor_id: i64) -> Result<BalanceBreakdown> {
        let mut tx = self.begin_snapshot().await?;
        let rows = AccrualRepository::breakdown_in_tx(&mut tx, visitor_id).await?;
        let spent = RedemptionRepository::sum_spent_in_tx(&mut tx, visitor_id).await?;
        tx.commit().await?;

        Ok(BalanceBreakdown::fold(visitor_id, &rows, spent))
    }

    /// 开启可重复读的只读事务
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}
