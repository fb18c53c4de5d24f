//! 参考数据仓储
//!
//! 场馆、奖品、题目由运营后台维护，这里只读

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::RegistryRepositoryTrait;
use crate::error::Result;
use crate::models::{Quiz, Reward, Venue};

pub struct RegistryRepository {
    pool: PgPool,
}

impl RegistryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 场馆 ====================

    pub async fn get_venue(&self, id: i64) -> Result<Option<Venue>> {
        let venue = sqlx::query_as::<_, Venue>(
            r#"
            SELECT id, name, address, latitude, longitude, scan_points, active
            FROM venues
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(venue)
    }

    // ==================== 奖品 ====================

    pub async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        let reward = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, venue_id, title, description, points, active
            FROM rewards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reward)
    }

    pub async fn list_active_rewards(&self) -> Result<Vec<Reward>> {
        let rewards = sqlx::query_as::<_, Reward>(
            r#"
            SELECT id, venue_id, title, description, points, active
            FROM rewards
            WHERE active = TRUE
            ORDER BY points ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rewards)
    }

    // ==================== 题目 ====================

    /// 批量获取题目，不存在的 ID 不会出现在结果中
    pub async fn get_quizzes_by_ids(&self, ids: &[i64]) -> Result<Vec<Quiz>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let quizzes = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, question, option_1, option_2, option_3, option_4,
                   correct_option, points, active
            FROM quizzes
            WHERE id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }

    pub async fn list_active_quizzes(&self) -> Result<Vec<Quiz>> {
        let quizzes = sqlx::query_as::<_, Quiz>(
            r#"
            SELECT id, question, option_1, option_2, option_3, option_4,
                   correct_option, points, active
            FROM quizzes
            WHERE active = TRUE
            ORDER BY id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(quizzes)
    }
}

#[async_trait]
impl RegistryRepositoryTrait for RegistryRepository {
    async fn get_venue(&self, id: i64) -> Result<Option<Venue>> {
        self.get_venue(id).await
    }

    async fn get_reward(&self, id: i64) -> Result<Option<Reward>> {
        self.get_reward(id).await
    }

    async fn list_active_rewards(&self) -> Result<Vec<Reward>> {
        self.list_active_rewards().await
    }

    async fn get_quizzes_by_ids(&self, ids: &[i64]) -> Result<Vec<Quiz>> {
        self.get_quizzes_by_ids(ids).await
    }

    async fn list_active_quizzes(&self) -> Result<Vec<Quiz>> {
        self.list_active_quizzes().await
    }
}
