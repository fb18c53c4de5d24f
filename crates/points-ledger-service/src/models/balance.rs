//! 余额与余额明细
//!
//! 余额不落库，每次都由入账事件与兑换记录现算

use serde::{Deserialize, Serialize};

use super::enums::AccrualSource;

/// 访客余额
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// 累计获得积分
    pub accrued: i64,
    /// 累计兑换消耗积分
    pub spent: i64,
}

impl Balance {
    pub fn new(accrued: i64, spent: i64) -> Self {
        Self { accrued, spent }
    }

    /// 可用余额
    pub fn available(&self) -> i64 {
        self.accrued - self.spent
    }

    pub fn covers(&self, cost: i64) -> bool {
        self.available() >= cost
    }
}

/// 分组聚合查询的单行结果
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccrualGroupRow {
    pub source: AccrualSource,
    pub venue_id: Option<i64>,
    pub venue_name: Option<String>,
    pub points: i64,
    pub events: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTotal {
    pub source: AccrualSource,
    pub points: i64,
    pub events: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueTotal {
    pub venue_id: i64,
    pub venue_name: Option<String>,
    pub points: i64,
    pub visits: i64,
}

/// 余额明细（按来源、按场馆分组的只读投影）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceBreakdown {
    pub visitor_id: i64,
    pub total_accrued: i64,
    pub total_spent: i64,
    pub balance: i64,
    pub by_source: Vec<SourceTotal>,
    pub by_venue: Vec<VenueTotal>,
}

impl BalanceBreakdown {
    /// 由分组行折叠出明细
    ///
    /// `total_accrued` 取分组之和，与 `spent` 一起推导余额
    pub fn fold(visitor_id: i64, rows: &[AccrualGroupRow], spent: i64) -> Self {
        let mut by_source: Vec<SourceTotal> = Vec::new();
        let mut by_venue: Vec<VenueTotal> = Vec::new();

        for row in rows {
            match by_source.iter_mut().find(|s| s.source == row.source) {
                Some(total) => {
                    total.points += row.points;
                    total.events += row.events;
                }
                None => by_source.push(SourceTotal {
                    source: row.source,
                    points: row.points,
                    events: row.events,
                }),
            }

            if let Some(venue_id) = row.venue_id {
                match by_venue.iter_mut().find(|v| v.venue_id == venue_id) {
                    Some(total) => {
                        total.points += row.points;
                        total.visits += row.events;
                    }
                    None => by_venue.push(VenueTotal {
                        venue_id,
                        venue_name: row.venue_name.clone(),
                        points: row.points,
                        visits: row.events,
                    }),
                }
            }
        }

        by_source.sort_by_key(|s| s.source.as_str());
        by_venue.sort_by(|a, b| b.points.cmp(&a.points).then(a.venue_id.cmp(&b.venue_id)));

        let total_accrued = by_source.iter().map(|s| s.points).sum();

        Self {
            visitor_id,
            total_accrued,
            total_spent: spent,
            balance: total_accrued - spent,
            by_source,
            by_venue,
        }
    }

    pub fn as_balance(&self) -> Balance {
        Balance::new(self.total_accrued, self.total_spent)
    }
}
