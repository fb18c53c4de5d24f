//! 题目与答题记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// 选项编号范围（从 1 开始）
pub const MIN_OPTION: i32 = 1;
pub const MAX_OPTION: i32 = 4;

/// 题目（参考数据，含标准答案）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub question: String,
    pub option_1: String,
    pub option_2: String,
    pub option_3: String,
    pub option_4: String,
    pub correct_option: i32,
    pub points: i32,
    pub active: bool,
}

impl Quiz {
    pub fn options(&self) -> Vec<String> {
        vec![
            self.option_1.clone(),
            self.option_2.clone(),
            self.option_3.clone(),
            self.option_4.clone(),
        ]
    }

    /// 对一个答案评分
    ///
    /// 选项越界视为参数错误，不产生答题记录
    pub fn score(&self, selected_option: i32) -> Result<ScoredAnswer> {
        validate_option(self.id, selected_option)?;

        let is_correct = selected_option == self.correct_option;
        Ok(ScoredAnswer {
            quiz_id: self.id,
            selected_option,
            is_correct,
            points_earned: if is_correct { self.points } else { 0 },
        })
    }
}

pub fn validate_option(quiz_id: i64, selected_option: i32) -> Result<()> {
    if !(MIN_OPTION..=MAX_OPTION).contains(&selected_option) {
        return Err(LedgerError::Validation(format!(
            "选项超出范围: quiz_id={}, selected_option={}, 允许 {}..={}",
            quiz_id, selected_option, MIN_OPTION, MAX_OPTION
        )));
    }
    Ok(())
}

/// 客户端提交的单个答案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub quiz_id: i64,
    pub selected_option: i32,
}

/// 评分后的答案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAnswer {
    pub quiz_id: i64,
    pub selected_option: i32,
    pub is_correct: bool,
    pub points_earned: i32,
}

/// 已持久化的答题记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub id: i64,
    pub visitor_id: i64,
    pub quiz_id: i64,
    pub selected_option: i32,
    pub is_correct: bool,
    pub points_earned: i32,
    pub submitted_at: DateTime<Utc>,
}

/// 面向访客展示的题目（不含标准答案）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub points: i32,
}

impl From<&Quiz> for QuizView {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            question: quiz.question.clone(),
            options: quiz.options(),
            points: quiz.points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(correct_option: i32, points: i32) -> Quiz {
        Quiz {
            id: 7,
            question: "How many Gurus?".to_string(),
            option_1: "5".to_string(),
            option_2: "10".to_string(),
            option_3: "11".to_string(),
            option_4: "12".to_string(),
            correct_option,
            points,
            active: true,
        }
    }

    #[test]
    fn test_score_correct_answer() {
        let scored = quiz(2, 20).score(2).unwrap();
        assert!(scored.is_correct);
        assert_eq!(scored.points_earned, 20);
    }

    #[test]
    fn test_score_wrong_answer_earns_nothing() {
        let scored = quiz(2, 20).score(3).unwrap();
        assert!(!scored.is_correct);
        assert_eq!(scored.points_earned, 0);
        assert_eq!(scored.selected_option, 3);
    }

    #[test]
    fn test_option_out_of_range() {
        assert!(matches!(quiz(2, 20).score(0), Err(LedgerError::Validation(_))));
        assert!(matches!(quiz(2, 20).score(5), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_view_hides_correct_option() {
        let view = QuizView::from(&quiz(4, 20));
        assert_eq!(view.options.len(), 4);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("correctOption").is_none());
    }
}
