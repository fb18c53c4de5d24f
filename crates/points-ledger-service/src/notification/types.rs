//! 通知事件定义

use serde::{Deserialize, Serialize};

use crate::models::AccrualSource;

/// 账本事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEvent {
    /// 积分入账
    #[serde(rename_all = "camelCase")]
    PointsAccrued {
        visitor_id: i64,
        source: AccrualSource,
        /// 场馆 ID 或题目 ID
        reference_id: i64,
        points: i64,
    },
    /// 奖品兑换
    #[serde(rename_all = "camelCase")]
    RewardRedeemed {
        visitor_id: i64,
        reward_id: i64,
        points_spent: i64,
    },
}

impl LedgerEvent {
    pub fn visitor_id(&self) -> i64 {
        match self {
            Self::PointsAccrued { visitor_id, .. } | Self::RewardRedeemed { visitor_id, .. } => {
                *visitor_id
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PointsAccrued { .. } => "POINTS_ACCRUED",
            Self::RewardRedeemed { .. } => "REWARD_REDEEMED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = LedgerEvent::PointsAccrued {
            visitor_id: 42,
            source: AccrualSource::VenueScan,
            reference_id: 5,
            points: 10,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "POINTS_ACCRUED");
        assert_eq!(json["visitorId"], 42);
        assert_eq!(json["source"], "VENUE_SCAN");
        assert_eq!(event.visitor_id(), 42);
    }

    #[test]
    fn test_event_kind() {
        let event = LedgerEvent::RewardRedeemed {
            visitor_id: 1,
            reward_id: 3,
            points_spent: 25,
        };
        assert_eq!(event.kind(), "REWARD_REDEEMED");
    }
}
