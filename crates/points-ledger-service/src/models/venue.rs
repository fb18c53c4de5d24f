//! 场馆与到访记录

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// 场馆（参考数据）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub address: Option<String>,
    #[sqlx(default)]
    pub latitude: Option<f64>,
    #[sqlx(default)]
    pub longitude: Option<f64>,
    /// 每次打卡奖励积分
    pub scan_points: i32,
    pub active: bool,
}

/// 扫码时客户端上报的位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl GeoPoint {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// 只校验取值范围，不做位置真实性判断
    pub fn validate(&self) -> Result<()> {
        if let Some(lat) = self.latitude.filter(|v| !(-90.0..=90.0).contains(v)) {
            return Err(LedgerError::Validation(format!("纬度超出范围: {}", lat)));
        }
        if let Some(lng) = self.longitude.filter(|v| !(-180.0..=180.0).contains(v)) {
            return Err(LedgerError::Validation(format!("经度超出范围: {}", lng)));
        }
        Ok(())
    }
}

/// 待写入的到访记录
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendanceLog {
    pub visitor_id: i64,
    pub venue_id: i64,
    pub accrual_event_id: i64,
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub points_awarded: i32,
    pub location: GeoPoint,
}

/// 到访历史条目
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VisitHistoryEntry {
    pub id: i64,
    pub venue_id: i64,
    pub venue_name: String,
    pub visit_date: NaiveDate,
    pub visit_time: NaiveTime,
    pub points_awarded: i32,
    #[sqlx(default)]
    pub latitude: Option<f64>,
    #[sqlx(default)]
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::default().validate().is_ok());
        assert!(GeoPoint::new(Some(31.62), Some(74.87)).validate().is_ok());
        assert!(GeoPoint::new(Some(91.0), None).validate().is_err());
        assert!(GeoPoint::new(None, Some(-181.0)).validate().is_err());
    }
}
