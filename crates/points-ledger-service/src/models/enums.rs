//! 账本枚举类型定义
//!
//! 枚举同时支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 积分来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualSource {
    /// 场馆扫码打卡
    VenueScan,
    /// 答题正确
    QuizCorrect,
}

impl AccrualSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VenueScan => "VENUE_SCAN",
            Self::QuizCorrect => "QUIZ_CORRECT",
        }
    }
}

impl std::fmt::Display for AccrualSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 答题提交方式（用于日志与指标）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    Single,
    Batch,
}

impl SubmissionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Batch => "batch",
        }
    }
}
