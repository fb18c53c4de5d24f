//! 历史查询服务（只读）
//!
//! 入账、到访、兑换历史以及可参与的题目 / 可兑换的奖品。
//! 这些都是账本的只读投影，不作为余额来源。

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use engagement_shared::config::LedgerConfig;

use crate::error::Result;
use crate::models::{
    AccrualHistoryEntry, Quiz, QuizView, RedemptionHistoryEntry, Reward, VisitHistoryEntry,
};
use crate::repository::{
    AccrualRepository, AttendanceRepository, QuizSubmissionRepository, RedemptionRepository,
    RegistryRepositoryTrait,
};

pub struct HistoryService {
    accrual_repo: Arc<AccrualRepository>,
    attendance_repo: Arc<AttendanceRepository>,
    redemption_repo: Arc<RedemptionRepository>,
    quiz_repo: Arc<QuizSubmissionRepository>,
    registry: Arc<dyn RegistryRepositoryTrait>,
    config: LedgerConfig,
}

impl HistoryService {
    pub fn new(
        accrual_repo: Arc<AccrualRepository>,
        attendance_repo: Arc<AttendanceRepository>,
        redemption_repo: Arc<RedemptionRepository>,
        quiz_repo: Arc<QuizSubmissionRepository>,
        registry: Arc<dyn RegistryRepositoryTrait>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            accrual_repo,
            attendance_repo,
            redemption_repo,
            quiz_repo,
            registry,
            config,
        }
    }

    /// 积分获取历史
    #[instrument(skip(self))]
    pub async fn points_history(
        &self,
        visitor_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<AccrualHistoryEntry>> {
        let limit = self.config.clamp_history_limit(limit);
        self.accrual_repo.list_by_visitor(visitor_id, limit).await
    }

    /// 到访历史
    #[instrument(skip(self))]
    pub async fn visit_history(
        &self,
        visitor_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<VisitHistoryEntry>> {
        let limit = self.config.clamp_history_limit(limit);
        self.attendance_repo.list_by_visitor(visitor_id, limit).await
    }

    /// 兑换历史
    #[instrument(skip(self))]
    pub async fn rewards_history(
        &self,
        visitor_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<RedemptionHistoryEntry>> {
        let limit = self.config.clamp_history_limit(limit);
        self.redemption_repo.list_by_visitor(visitor_id, limit).await
    }

    /// 访客尚未作答的上线题目（不含标准答案）
    #[instrument(skip(self))]
    pub async fn available_quizzes(&self, visitor_id: i64) -> Result<Vec<QuizView>> {
        let quizzes = self.registry.list_active_quizzes().await?;
        let submitted = self.quiz_repo.list_submitted_quiz_ids(visitor_id).await?;
        Ok(unanswered_quizzes(&quizzes, &submitted))
    }

    /// 访客尚未兑换的上线奖品
    #[instrument(skip(self))]
    pub async fn available_rewards(&self, visitor_id: i64) -> Result<Vec<Reward>> {
        let rewards = self.registry.list_active_rewards().await?;
        let redeemed = self.redemption_repo.list_redeemed_reward_ids(visitor_id).await?;
        Ok(unredeemed_rewards(rewards, &redeemed))
    }
}

fn unanswered_quizzes(quizzes: &[Quiz], submitted: &[i64]) -> Vec<QuizView> {
    let submitted: HashSet<i64> = submitted.iter().copied().collect();
    quizzes
        .iter()
        .filter(|q| q.active && !submitted.contains(&q.id))
        .map(QuizView::from)
        .collect()
}

fn unredeemed_rewards(rewards: Vec<Reward>, redeemed: &[i64]) -> Vec<Reward> {
    let redeemed: HashSet<i64> = redeemed.iter().copied().collect();
    rewards
        .into_iter()
        .filter(|r| r.active && !redeemed.contains(&r.id))
        .collect()
}
