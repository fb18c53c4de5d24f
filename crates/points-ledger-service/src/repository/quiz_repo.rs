//! 答题记录仓储
//!
//! `quiz_submissions` 在 (visitor_id, quiz_id) 上唯一，答对答错都只能提交一次

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::Result;
use crate::models::{QuizSubmission, ScoredAnswer};

pub struct QuizSubmissionRepository {
    pool: PgPool,
}

impl QuizSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 条件插入答题记录，已提交过时返回 None
    pub async fn insert_in_tx(
        tx: &mut PgConnection,
        visitor_id: i64,
        answer: &ScoredAnswer,
        submitted_at: DateTime<Utc>,
    ) -> Result<Option<QuizSubmission>> {
        let submission = sqlx::query_as::<_, QuizSubmission>(
            r#"
            INSERT INTO quiz_submissions
                (visitor_id, quiz_id, selected_option, is_correct, points_earned, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (visitor_id, quiz_id) DO NOTHING
            RETURNING id, visitor_id, quiz_id, selected_option, is_correct, points_earned, submitted_at
            "#,
        )
        .bind(visitor_id)
        .bind(answer.quiz_id)
        .bind(answer.selected_option)
        .bind(answer.is_correct)
        .bind(answer.points_earned)
        .bind(submitted_at)
        .fetch_optional(tx)
        .await?;

        Ok(submission)
    }

    /// 给定题目中访客已提交过的题目 ID
    pub async fn list_submitted_quiz_ids_in_tx(
        tx: &mut PgConnection,
        visitor_id: i64,
        quiz_ids: &[i64],
    ) -> Result<Vec<i64>> {
        if quiz_ids.is_empty() {
            return Ok(vec![]);
        }

        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT quiz_id
            FROM quiz_submissions
            WHERE visitor_id = $1 AND quiz_id = ANY($2)
            ORDER BY quiz_id ASC
            "#,
        )
        .bind(visitor_id)
        .bind(quiz_ids)
        .fetch_all(tx)
        .await?;

        Ok(ids)
    }

    /// 访客提交过的全部题目 ID
    pub async fn list_submitted_quiz_ids(&self, visitor_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT quiz_id FROM quiz_submissions WHERE visitor_id = $1 ORDER BY quiz_id ASC",
        )
        .bind(visitor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
