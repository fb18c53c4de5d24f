//! 答题提交协调器
//!
//! 对照标准答案评分，并把答题记录与答对产生的入账事件放在同一事务中写入。
//! 批量提交全有或全无：只要有一题已提交过或题目不存在，整批拒绝，
//! 并返回具体的题目 ID 供客户端对账。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use engagement_shared::config::LedgerConfig;
use engagement_shared::observability::metrics;
use engagement_shared::retry::{RetryPolicy, retry_with_policy};

use crate::error::{LedgerError, Result};
use crate::models::{AccrualSource, Quiz, QuizAnswer, ScoredAnswer, SubmissionMode, quiz};
use crate::notification::{LedgerEvent, NotificationSender};
use crate::repository::{QuizSubmissionRepository, RegistryRepositoryTrait};
use crate::service::dto::{BatchQuizResult, QuizResult};
use crate::service::event_recorder::EventRecorder;

/// 单批最多提交的题目数
pub const MAX_BATCH_SIZE: usize = 50;

pub struct QuizCoordinator {
    pool: PgPool,
    registry: Arc<dyn RegistryRepositoryTrait>,
    retry_policy: RetryPolicy,
    notifier: NotificationSender,
}

impl QuizCoordinator {
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

    /// 提交单题答案
    #[instrument(skip_all, fields(visitor_id = %visitor_id, quiz_id = %quiz_id))]
    pub async fn submit_quiz(
        &self,
        visitor_id: i64,
        quiz_id: i64,
        selected_option: i32,
    ) -> Result<QuizResult> {
        let answers = [QuizAnswer {
            quiz_id,
            selected_option,
        }];

        let scored = self
            .submit(visitor_id, &answers, SubmissionMode::Single)
            .await?;

        scored
            .into_iter()
            .next()
            .map(QuizResult::from)
            .ok_or_else(|| LedgerError::Internal("单题提交未产生评分结果".to_string()))
    }

    /// 批量提交答案（全有或全无）
    #[instrument(skip_all, fields(visitor_id = %visitor_id, batch_size = answers.len()))]
    pub async fn submit_quizzes(
        &self,
        visitor_id: i64,
        answers: &[QuizAnswer],
    ) -> Result<BatchQuizResult> {
        let scored = self
            .submit(visitor_id, answers, SubmissionMode::Batch)
            .await?;

        Ok(BatchQuizResult::from_scored(&scored))
    }

    async fn submit(
        &self,
        visitor_id: i64,
        answers: &[QuizAnswer],
        mode: SubmissionMode,
    ) -> Result<Vec<ScoredAnswer>> {
        let start = Instant::now();
        let operation = match mode {
            SubmissionMode::Single => "submit_quiz",
            SubmissionMode::Batch => "submit_quizzes",
        };

        let result = retry_with_policy(
            &self.retry_policy,
            operation,
            LedgerError::is_retryable,
            || self.try_submit(visitor_id, answers, mode),
        )
        .await;

        metrics::record_operation_duration(operation, start.elapsed().as_secs_f64());

        match &result {
            Ok(scored) => {
                metrics::record_quiz_submission(mode.as_str(), "accepted");
                let mut earned = 0i64;
                for answer in scored.iter().filter(|a| a.is_correct) {
                    earned += i64::from(answer.points_earned);
                    metrics::record_accrual(AccrualSource::QuizCorrect.as_str(), "accepted");
                    self.notifier.notify(LedgerEvent::PointsAccrued {
                        visitor_id,
                        source: AccrualSource::QuizCorrect,
                        reference_id: answer.quiz_id,
                        points: i64::from(answer.points_earned),
                    });
                }
                info!(mode = mode.as_str(), submitted = scored.len(), earned, "答题已提交");
            }
            Err(e) => {
                metrics::record_quiz_submission(mode.as_str(), &e.outcome_label());
                if e.is_expected_outcome() {
                    info!(mode = mode.as_str(), code = e.error_code(), "答题未执行: {}", e);
                } else if e.is_client_error() {
                    warn!(mode = mode.as_str(), code = e.error_code(), "答题被拒绝: {}", e);
                } else {
                    error!(mode = mode.as_str(), error = %e, "答题提交失败");
                }
            }
        }

        result
    }

    async fn try_submit(
        &self,
        visitor_id: i64,
        answers: &[QuizAnswer],
        mode: SubmissionMode,
    ) -> Result<Vec<ScoredAnswer>> {
        let quiz_ids = validate_answers(answers)?;

        let quizzes = self.registry.get_quizzes_by_ids(&quiz_ids).await?;
        let (scored, not_found) = score_answers(answers, &quizzes)?;

        if let (SubmissionMode::Single, Some(&quiz_id)) = (mode, not_found.first()) {
            return Err(LedgerError::QuizNotFound(quiz_id));
        }

        let mut tx = self.pool.begin().await?;

        let already_submitted =
            QuizSubmissionRepository::list_submitted_quiz_ids_in_tx(&mut tx, visitor_id, &quiz_ids)
                .await?;

        match mode {
            SubmissionMode::Single => {
                if let Some(&quiz_id) = already_submitted.first() {
                    return Err(LedgerError::AlreadySubmitted { quiz_id });
                }
            }
            SubmissionMode::Batch => {
                if !already_submitted.is_empty() || !not_found.is_empty() {
                    return Err(LedgerError::BatchRejected {
                        already_submitted,
                        not_found,
                    });
                }
            }
        }

        // 按题目 ID 升序加行锁，重叠的并发批次不会互相死锁
        let submitted_at = Utc::now();
        for answer in write_order(&scored) {
            if QuizSubmissionRepository::insert_in_tx(&mut tx, visitor_id, answer, submitted_at)
                .await?
                .is_none()
            {
                metrics::record_storage_conflict("quiz_submission");
                return Err(LedgerError::StorageConflict("quiz_submission".to_string()));
            }

            if answer.is_correct {
                EventRecorder::record_quiz_correct_in_tx(
                    &mut tx,
                    visitor_id,
                    answer.quiz_id,
                    answer.points_earned,
                    submitted_at,
                )
                .await
                .map_err(|e| match e {
                    LedgerError::AlreadySubmitted { .. } => {
                        metrics::record_storage_conflict("quiz_accrual");
                        LedgerError::StorageConflict("quiz_accrual".to_string())
                    }
                    other => other,
                })?;
            }
        }

        tx.commit().await?;
        Ok(scored)
    }
}

/// 校验答案集合的形状，返回题目 ID 列表（保持请求顺序）
///
/// 空批次、超过上限、同一题目出现两次、选项越界都属于参数错误
pub fn validate_answers(answers: &[QuizAnswer]) -> Result<Vec<i64>> {
    if answers.is_empty() {
        return Err(LedgerError::Validation("答案列表不能为空".to_string()));
    }
    if answers.len() > MAX_BATCH_SIZE {
        return Err(LedgerError::Validation(format!(
            "单批最多提交 {} 题，实际 {}",
            MAX_BATCH_SIZE,
            answers.len()
        )));
    }

    let mut seen = HashSet::with_capacity(answers.len());
    let mut quiz_ids = Vec::with_capacity(answers.len());
    for answer in answers {
        if !seen.insert(answer.quiz_id) {
            return Err(LedgerError::Validation(format!(
                "同一批次中题目重复: quiz_id={}",
                answer.quiz_id
            )));
        }
        quiz::validate_option(answer.quiz_id, answer.selected_option)?;
        quiz_ids.push(answer.quiz_id);
    }

    Ok(quiz_ids)
}

/// 写入顺序：按题目 ID 升序，响应仍保持请求顺序
fn write_order(scored: &[ScoredAnswer]) -> Vec<&ScoredAnswer> {
    let mut ordered: Vec<&ScoredAnswer> = scored.iter().collect();
    ordered.sort_by_key(|answer| answer.quiz_id);
    ordered
}

/// 对照标准答案评分
///
/// 返回按请求顺序排列的评分结果，以及不存在或已下线的题目 ID
pub fn score_answers(
    answers: &[QuizAnswer],
    quizzes: &[Quiz],
) -> Result<(Vec<ScoredAnswer>, Vec<i64>)> {
    let by_id: HashMap<i64, &Quiz> = quizzes
        .iter()
        .filter(|q| q.active)
        .map(|q| (q.id, q))
        .collect();

    let mut scored = Vec::with_capacity(answers.len());
    let mut not_found = Vec::new();

    for answer in answers {
        match by_id.get(&answer.quiz_id) {
            Some(quiz) => scored.push(quiz.score(answer.selected_option)?),
            None => not_found.push(answer.quiz_id),
        }
    }

    Ok((scored, not_found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockRegistryRepositoryTrait;
    use engagement_shared::test_utils::{test_ledger_config, unreachable_pool};

    fn quiz(id: i64, correct_option: i32, points: i32) -> Quiz {
        Quiz {
            id,
            question: format!("question {id}"),
            option_1: "a".to_string(),
            option_2: "b".to_string(),
            option_3: "c".to_string(),
            option_4: "d".to_string(),
            correct_option,
            points,
            active: true,
        }
    }

    fn answer(quiz_id: i64, selected_option: i32) -> QuizAnswer {
        QuizAnswer {
            quiz_id,
            selected_option,
        }
    }

    fn coordinator(registry: MockRegistryRepositoryTrait) -> QuizCoordinator {
        QuizCoordinator::new(
            unreachable_pool(),
            Arc::new(registry),
            &test_ledger_config(),
            NotificationSender::log_only(),
        )
    }

    #[test]
    fn test_validate_answers_rejects_duplicates() {
        let err = validate_answers(&[answer(1, 1), answer(2, 2), answer(1, 3)]).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_validate_answers_rejects_empty_and_oversized() {
        assert!(validate_answers(&[]).is_err());

        let too_many: Vec<QuizAnswer> = (1..=(MAX_BATCH_SIZE as i64 + 1))
            .map(|id| answer(id, 1))
            .collect();
        assert!(validate_answers(&too_many).is_err());
    }

    #[test]
    fn test_validate_answers_keeps_order() {
        let ids = validate_answers(&[answer(9, 1), answer(3, 4), answer(5, 2)]).unwrap();
        assert_eq!(ids, vec![9, 3, 5]);
    }

    #[test]
    fn test_validate_answers_rejects_option_out_of_range() {
        assert!(matches!(
            validate_answers(&[answer(1, 0)]),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_score_answers() {
        let quizzes = vec![quiz(1, 2, 20), quiz(2, 3, 10), quiz(3, 1, 15)];
        let (scored, not_found) =
            score_answers(&[answer(3, 1), answer(1, 4), answer(2, 3)], &quizzes).unwrap();

        assert!(not_found.is_empty());
        assert_eq!(scored.len(), 3);
        assert_eq!(scored[0].quiz_id, 3);
        assert!(scored[0].is_correct);
        assert_eq!(scored[0].points_earned, 15);
        assert!(!scored[1].is_correct);
        assert_eq!(scored[1].points_earned, 0);
        assert!(scored[2].is_correct);
    }

    #[test]
    fn test_write_order_is_ascending_and_keeps_response_order() {
        let quizzes = vec![quiz(1, 1, 10), quiz(2, 1, 10), quiz(3, 1, 10)];
        let (scored, _) =
            score_answers(&[answer(3, 1), answer(1, 1), answer(2, 1)], &quizzes).unwrap();

        let ids: Vec<i64> = write_order(&scored).iter().map(|a| a.quiz_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            scored.iter().map(|a| a.quiz_id).collect::<Vec<_>>(),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn test_score_answers_reports_missing_and_inactive() {
        let mut inactive = quiz(2, 1, 10);
        inactive.active = false;
        let quizzes = vec![quiz(1, 1, 10), inactive];

        let (scored, not_found) =
            score_answers(&[answer(1, 1), answer(2, 1), answer(3, 1)], &quizzes).unwrap();

        assert_eq!(scored.len(), 1);
        assert_eq!(not_found, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_single_submission_unknown_quiz() {
        let mut registry = MockRegistryRepositoryTrait::new();
        registry
            .expect_get_quizzes_by_ids()
            .times(1)
            .returning(|_| Ok(vec![]));

        let err = coordinator(registry).submit_quiz(1, 7, 2).await.unwrap_err();
        assert!(matches!(err, LedgerError::QuizNotFound(7)));
    }

    #[tokio::test]
    async fn test_duplicate_batch_rejected_before_lookup() {
        // 参数错误在查询参考数据之前返回
        let registry = MockRegistryRepositoryTrait::new();

        let err = coordinator(registry)
            .submit_quizzes(1, &[answer(4, 1), answer(4, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
