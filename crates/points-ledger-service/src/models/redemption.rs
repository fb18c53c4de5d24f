//! 奖品与兑换记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 奖品（参考数据）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: i64,
    /// 关联场馆（仅展示用，兑换不限制场馆）
    pub venue_id: Option<i64>,
    pub title: String,
    #[sqlx(default)]
    pub description: Option<String>,
    /// 兑换所需积分
    pub points: i32,
    pub active: bool,
}

/// 已持久化的兑换记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRecord {
    pub id: i64,
    pub visitor_id: i64,
    pub reward_id: i64,
    pub points_spent: i32,
    pub redeemed_at: DateTime<Utc>,
}

/// 兑换历史条目（附带奖品标题）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionHistoryEntry {
    pub id: i64,
    pub reward_id: i64,
    pub reward_title: String,
    pub points_spent: i32,
    pub redeemed_at: DateTime<Utc>,
}
