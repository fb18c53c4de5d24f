//! 兑换闸门
//!
//! ## 兑换流程
//!
//! 1. 查奖品（不存在或已下线 -> RewardNotFound）
//! 2. 开启事务并对访客加咨询锁
//! 3. 查重（已兑换 -> AlreadyRedeemed）
//! 4. 在同一事务内重新计算余额（不足 -> InsufficientBalance）
//! 5. 条件插入兑换记录并提交
//!
//! 步骤 3~5 对同一访客串行执行，两个并发兑换不可能同时通过余额判定。
//! 唯一索引 (visitor_id, reward_id) 作为最后一道防线。

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use engagement_shared::config::LedgerConfig;
use engagement_shared::observability::metrics;
use engagement_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::{LedgerError, Result};
use crate::models::Reward;
use crate::notification::{LedgerEvent, NotificationSender};
use crate::repository::{RedemptionRepository, RegistryRepositoryTrait};
use crate::service::balance_service::BalanceService;
use crate::service::dto::RedemptionReceipt;

pub struct RedemptionGate {
    pool: PgPool,
    registry: Arc<dyn RegistryRepositoryTrait>,
    retry_policy: RetryPolicy,
    notifier: NotificationSender,
}

impl RedemptionGate {
    pub fn new(
        pool: PgPool,
        registry: Arc<dyn RegistryRepositoryTrait>,
        config: &LedgerConfig,
        notifier: NotificationSender,
    ) -> Self {
        Self {
            pool,
            registry,
            retry_policy: RetryPolicy::single(config.conflict_retry_delay()),
            notifier,
        }
    }

    /// 用积分兑换奖品
    #[instrument(skip_all, fields(visitor_id = %visitor_id, reward_id = %reward_id))]
    pub async fn redeem(&self, visitor_id: i64, reward_id: i64) -> Result<RedemptionReceipt> {
        let start = Instant::now();

        let result = retry_with_policy(
            &self.retry_policy,
            "redeem",
            LedgerError::is_retryable,
            || self.try_redeem(visitor_id, reward_id),
        )
        .await;

        metrics::record_operation_duration("redeem", start.elapsed().as_secs_f64());

        match &result {
            Ok(receipt) => {
                metrics::record_redemption("redeemed");
                info!(
                    redemption_id = receipt.redemption_id,
                    points_spent = receipt.points_spent,
                    balance_after = receipt.balance_after,
                    "奖品兑换成功"
                );
                self.notifier.notify(LedgerEvent::RewardRedeemed {
                    visitor_id,
                    reward_id,
                    points_spent: receipt.points_spent,
                });
            }
            Err(e) => {
                metrics::record_redemption(&e.outcome_label());
                if e.is_expected_outcome() {
                    info!(code = e.error_code(), "兑换未执行: {}", e);
                } else if e.is_client_error() {
                    warn!(code = e.error_code(), "兑换被拒绝: {}", e);
                } else {
                    error!(code = e.error_code(), error = %e, "兑换失败");
                }
            }
        }

        result
    }

    async fn try_redeem(&self, visitor_id: i64, reward_id: i64) -> Result<RedemptionReceipt> {
        // 1. 奖品有效性
        let reward = self.get_active_reward(reward_id).await?;
        let cost = i64::from(reward.points);

        let mut tx = self.pool.begin().await?;

        // 2. 同一访客的兑换串行化
        RedemptionRepository::lock_visitor_in_tx(&mut tx, visitor_id).await?;

        // 3. 查重
        if RedemptionRepository::find_in_tx(&mut tx, visitor_id, reward_id)
            .await?
            .is_some()
        {
            return Err(LedgerError::AlreadyRedeemed { reward_id });
        }

        // 4. 同一事务内重新计算余额
        let balance = BalanceService::get_balance_in_tx(&mut tx, visitor_id).await?;
        if !balance.covers(cost) {
            return Err(LedgerError::InsufficientBalance {
                required: cost,
                available: balance.available(),
            });
        }

        // 5. 条件插入，冲突说明有绕过咨询锁的并发写入，交给重试重新推导
        let record = RedemptionRepository::insert_in_tx(
            &mut tx,
            visitor_id,
            reward_id,
            reward.points,
            Utc::now(),
        )
        .await?
        .ok_or_else(|| {
            metrics::record_storage_conflict("redeem");
            LedgerError::StorageConflict("redeem".to_string())
        })?;

        tx.commit().await?;

        Ok(RedemptionReceipt {
            redeemed: true,
            redemption_id: record.id,
            reward_id,
            reward_title: reward.title,
            points_spent: i64::from(record.points_spent),
            balance_after: balance.available() - i64::from(record.points_spent),
            redeemed_at: record.redeemed_at,
        })
    }

    async fn get_active_reward(&self, reward_id: i64) -> Result<Reward> {
        self.registry
            .get_reward(reward_id)
            .await?
            .filter(|reward| reward.active)
            .ok_or(LedgerError::RewardNotFound(reward_id))
    }
}
