//! 积分入账事件
//!
//! 入账事件只追加、不修改，是余额的唯一数据来源

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AccrualSource;

/// 已持久化的入账事件
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccrualEvent {
    pub id: i64,
    pub visitor_id: i64,
    pub source: AccrualSource,
    /// 仅 VENUE_SCAN 有值
    pub venue_id: Option<i64>,
    /// 仅 QUIZ_CORRECT 有值
    pub quiz_id: Option<i64>,
    pub points: i32,
    /// 打卡所在自然日，仅 VENUE_SCAN 有值
    pub visit_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

/// 待写入的入账事件
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccrualEvent {
    pub visitor_id: i64,
    pub source: AccrualSource,
    pub venue_id: Option<i64>,
    pub quiz_id: Option<i64>,
    pub points: i32,
    pub visit_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

impl NewAccrualEvent {
    /// 场馆打卡事件，自然日按给定时区偏移计算
    pub fn venue_scan(
        visitor_id: i64,
        venue_id: i64,
        points: i32,
        occurred_at: DateTime<Utc>,
        day_offset: FixedOffset,
    ) -> Self {
        Self {
            visitor_id,
            source: AccrualSource::VenueScan,
            venue_id: Some(venue_id),
            quiz_id: None,
            points,
            visit_date: Some(calendar_day(occurred_at, day_offset)),
            occurred_at,
        }
    }

    /// 答题正确事件
    pub fn quiz_correct(
        visitor_id: i64,
        quiz_id: i64,
        points: i32,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            visitor_id,
            source: AccrualSource::QuizCorrect,
            venue_id: None,
            quiz_id: Some(quiz_id),
            points,
            visit_date: None,
            occurred_at,
        }
    }
}

/// 时间点在指定时区偏移下的自然日
pub fn calendar_day(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

/// 入账历史条目（附带场馆名 / 题目）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccrualHistoryEntry {
    pub id: i64,
    pub source: AccrualSource,
    pub venue_id: Option<i64>,
    #[sqlx(default)]
    pub venue_name: Option<String>,
    pub quiz_id: Option<i64>,
    #[sqlx(default)]
    pub quiz_question: Option<String>,
    pub points: i32,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_calendar_day_respects_offset() {
        // UTC 2026-03-01 20:00 在 +05:30 已经是 3 月 2 日
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let ist = FixedOffset::east_opt(330 * 60).unwrap();

        assert_eq!(calendar_day(at, utc), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(calendar_day(at, ist), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_venue_scan_event_carries_visit_date() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let event =
            NewAccrualEvent::venue_scan(42, 5, 10, at, FixedOffset::east_opt(0).unwrap());

        assert_eq!(event.source, AccrualSource::VenueScan);
        assert_eq!(event.venue_id, Some(5));
        assert_eq!(event.quiz_id, None);
        assert_eq!(event.visit_date, NaiveDate::from_ymd_opt(2026, 3, 1));
    }

    #[test]
    fn test_quiz_event_has_no_venue() {
        let event = NewAccrualEvent::quiz_correct(42, 7, 20, Utc::now());
        assert_eq!(event.source, AccrualSource::QuizCorrect);
        assert_eq!(event.quiz_id, Some(7));
        assert!(event.venue_id.is_none());
        assert!(event.visit_date.is_none());
    }
}
