//! 仓储 Trait 定义
//!
//! 参考数据查询通过 trait 注入服务层，便于 mock 测试

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Quiz, Reward, Venue};

/// 参考数据（场馆 / 奖品 / 题目）只读仓储接口
///
/// 每次调用都直接查询，不做缓存
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryRepositoryTrait: Send + Sync {
    // 场馆
    async fn get_venue(&self, id: i64) -> Result<Option<Venue>>;

    // 奖品
    async fn get_reward(&self, id: i64) -> Result<Option<Reward>>;
    async fn list_active_rewards(&self) -> Result<Vec<Reward>>;

    // 题目
    async fn get_quizzes_by_ids(&self, ids: &[i64]) -> Result<Vec<Quiz>>;
    async fn list_active_quizzes(&self) -> Result<Vec<Quiz>>;
}
