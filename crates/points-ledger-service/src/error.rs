//! 积分账本错误类型
//!
//! 区分三类结果：预期内的负面结果（重复打卡、已答题、已兑换）、
//! 客户端输入错误、存储层故障。

use chrono::NaiveDate;
use thiserror::Error;

/// 积分账本错误类型
#[derive(Debug, Error)]
pub enum LedgerError {
    // === 预期内结果（非故障）===
    #[error("今日已在该场馆打卡: venue_id={venue_id}, visit_date={visit_date}")]
    DuplicateScan { venue_id: i64, visit_date: NaiveDate },

    #[error("该题目已提交过答案: quiz_id={quiz_id}")]
    AlreadySubmitted { quiz_id: i64 },

    #[error("该奖品已兑换过: reward_id={reward_id}")]
    AlreadyRedeemed { reward_id: i64 },

    // === 客户端错误 ===
    #[error("积分余额不足: 需要 {required}, 可用 {available}")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("奖品不存在或已下线: {0}")]
    RewardNotFound(i64),

    #[error("题目不存在或已下线: {0}")]
    QuizNotFound(i64),

    #[error("场馆不存在或已下线: {0}")]
    VenueNotFound(i64),

    #[error("二维码内容无法识别: {0}")]
    InvalidScanFormat(String),

    #[error("二维码类型不匹配: 期望 {expected}, 实际 {actual}")]
    WrongScanType { expected: String, actual: String },

    #[error(
        "批量答题被拒绝: 已提交 {already_submitted:?}, 不存在 {not_found:?}"
    )]
    BatchRejected {
        already_submitted: Vec<i64>,
        not_found: Vec<i64>,
    },

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 存储错误 ===
    #[error("写入冲突: operation={0}")]
    StorageConflict(String),

    #[error("存储不可用: {0}")]
    StorageUnavailable(String),

    #[error("数据库错误: {0}")]
    Database(sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分账本 Result 类型别名
pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(
            err,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
        ) {
            return Self::StorageUnavailable(err.to_string());
        }

        if let Some(db_err) = err.as_database_error() {
            // serialization_failure / deadlock_detected
            let code = db_err.code();
            if matches!(code.as_deref(), Some("40001") | Some("40P01")) {
                return Self::StorageConflict(db_err.message().to_string());
            }
        }

        Self::Database(err)
    }
}

impl LedgerError {
    /// 是否为预期内的负面结果（调用方应按正常结果展示）
    pub fn is_expected_outcome(&self) -> bool {
        matches!(
            self,
            Self::DuplicateScan { .. } | Self::AlreadySubmitted { .. } | Self::AlreadyRedeemed { .. }
        )
    }

    /// 是否为客户端输入导致的错误
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance { .. }
                | Self::RewardNotFound(_)
                | Self::QuizNotFound(_)
                | Self::VenueNotFound(_)
                | Self::InvalidScanFormat(_)
                | Self::WrongScanType { .. }
                | Self::BatchRejected { .. }
                | Self::Validation(_)
        )
    }

    /// 是否可在服务内部重试一次
    ///
    /// 只有写入冲突会被重试，重试时重新推导结果
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageConflict(_))
    }

    /// 获取错误码（用于 API 响应和指标标签）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateScan { .. } => "DUPLICATE_SCAN",
            Self::AlreadySubmitted { .. } => "ALREADY_SUBMITTED",
            Self::AlreadyRedeemed { .. } => "ALREADY_REDEEMED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::RewardNotFound(_) => "REWARD_NOT_FOUND",
            Self::QuizNotFound(_) => "QUIZ_NOT_FOUND",
            Self::VenueNotFound(_) => "VENUE_NOT_FOUND",
            Self::InvalidScanFormat(_) => "INVALID_SCAN_FORMAT",
            Self::WrongScanType { .. } => "WRONG_SCAN_TYPE",
            Self::BatchRejected { .. } => "BATCH_REJECTED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StorageConflict(_) => "STORAGE_CONFLICT",
            Self::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 指标中使用的结果标签
    pub fn outcome_label(&self) -> String {
        self.error_code().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_outcomes_are_not_client_errors() {
        let dup = LedgerError::DuplicateScan {
            venue_id: 5,
            visit_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        };
        assert!(dup.is_expected_outcome());
        assert!(!dup.is_client_error());
        assert!(LedgerError::AlreadySubmitted { quiz_id: 7 }.is_expected_outcome());
        assert!(LedgerError::AlreadyRedeemed { reward_id: 1 }.is_expected_outcome());
    }

    #[test]
    fn test_client_errors() {
        assert!(
            LedgerError::InsufficientBalance {
                required: 25,
                available: 10
            }
            .is_client_error()
        );
        assert!(LedgerError::RewardNotFound(1).is_client_error());
        assert!(LedgerError::InvalidScanFormat("not json".into()).is_client_error());
        assert!(!LedgerError::StorageUnavailable("down".into()).is_client_error());
        assert!(!LedgerError::Internal("boom".into()).is_expected_outcome());
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(LedgerError::StorageConflict("redeem".into()).is_retryable());
        assert!(!LedgerError::StorageUnavailable("down".into()).is_retryable());
        assert!(!LedgerError::AlreadyRedeemed { reward_id: 1 }.is_retryable());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            LedgerError::WrongScanType {
                expected: "gurudwara_visit".into(),
                actual: "reward".into()
            }
            .error_code(),
            "WRONG_SCAN_TYPE"
        );
        assert_eq!(
            LedgerError::BatchRejected {
                already_submitted: vec![2],
                not_found: vec![]
            }
            .error_code(),
            "BATCH_REJECTED"
        );
        assert_eq!(
            LedgerError::AlreadyRedeemed { reward_id: 3 }.outcome_label(),
            "already_redeemed"
        );
    }

    #[test]
    fn test_sqlx_pool_errors_map_to_unavailable() {
        let err: LedgerError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, LedgerError::StorageUnavailable(_)));

        let err: LedgerError = sqlx::Error::PoolClosed.into();
        assert_eq!(err.error_code(), "STORAGE_UNAVAILABLE");

        let err: LedgerError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, LedgerError::Database(_)));
    }

    #[test]
    fn test_batch_rejected_display_lists_ids() {
        let err = LedgerError::BatchRejected {
            already_submitted: vec![2, 9],
            not_found: vec![4],
        };
        let text = err.to_string();
        assert!(text.contains("[2, 9]"));
        assert!(text.contains("[4]"));
    }
}
