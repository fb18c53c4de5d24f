//! 服务层数据传输对象
//!
//! 各账本操作成功时返回的结果，失败结果统一走 `LedgerError`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AccrualEvent, ScoredAnswer};

/// 打卡入账结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAccrual {
    pub accepted: bool,
    pub points_awarded: i64,
    pub venue_id: i64,
    pub visit_date: NaiveDate,
    pub accrual_event_id: i64,
}

impl ScanAccrual {
    pub fn from_event(event: &AccrualEvent, venue_id: i64, visit_date: NaiveDate) -> Self {
        Self {
            accepted: true,
            points_awarded: i64::from(event.points),
            venue_id,
            visit_date,
            accrual_event_id: event.id,
        }
    }
}

/// 扫码打卡结果（含到访记录）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueScanResult {
    #[serde(flatten)]
    pub accrual: ScanAccrual,
    pub venue_name: String,
    pub attendance_log_id: i64,
}

/// 单题提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub quiz_id: i64,
    pub is_correct: bool,
    pub points_earned: i64,
}

impl From<ScoredAnswer> for QuizResult {
    fn from(answer: ScoredAnswer) -> Self {
        Self {
            quiz_id: answer.quiz_id,
            is_correct: answer.is_correct,
            points_earned: i64::from(answer.points_earned),
        }
    }
}

/// 批量提交结果，顺序与请求一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuizResult {
    pub results: Vec<QuizResult>,
    pub correct_count: usize,
    pub total_points_earned: i64,
}

impl BatchQuizResult {
    pub fn from_scored(scored: &[ScoredAnswer]) -> Self {
        let results: Vec<QuizResult> = scored.iter().copied().map(QuizResult::from).collect();
        Self {
            correct_count: results.iter().filter(|r| r.is_correct).count(),
            total_points_earned: results.iter().map(|r| r.points_earned).sum(),
            results,
        }
    }
}

/// 兑换成功回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionReceipt {
    pub redeemed: bool,
    pub redemption_id: i64,
    pub reward_id: i64,
    pub reward_title: String,
    pub points_spent: i64,
    /// 兑换后的可用余额
    pub balance_after: i64,
    pub redeemed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_result_totals() {
        let scored = vec![
            ScoredAnswer {
                quiz_id: 1,
                selected_option: 2,
                is_correct: true,
                points_earned: 20,
            },
            ScoredAnswer {
                quiz_id: 2,
                selected_option: 1,
                is_correct: false,
                points_earned: 0,
            },
            ScoredAnswer {
                quiz_id: 3,
                selected_option: 4,
                is_correct: true,
                points_earned: 15,
            },
        ];

        let result = BatchQuizResult::from_scored(&scored);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.total_points_earned, 35);
        assert_eq!(
            result.results.iter().map(|r| r.quiz_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_scan_result_flattens_accrual() {
        let result = VenueScanResult {
            accrual: ScanAccrual {
                accepted: true,
                points_awarded: 10,
                venue_id: 5,
                visit_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                accrual_event_id: 99,
            },
            venue_name: "Harmandir Sahib".to_string(),
            attendance_log_id: 12,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["pointsAwarded"], 10);
        assert_eq!(json["visitDate"], "2026-03-01");
        assert_eq!(json["attendanceLogId"], 12);
    }
}
