//! 积分账本领域模型
//!
//! 包含账本事件、余额投影、参考数据和扫码内容解码

pub mod accrual;
pub mod balance;
pub mod enums;
pub mod quiz;
pub mod redemption;
pub mod scan;
pub mod venue;

// 重新导出常用类型
pub use accrual::{AccrualEvent, AccrualHistoryEntry, NewAccrualEvent, calendar_day};
pub use balance::{AccrualGroupRow, Balance, BalanceBreakdown, SourceTotal, VenueTotal};
pub use enums::{AccrualSource, SubmissionMode};
pub use quiz::{Quiz, QuizAnswer, QuizSubmission, QuizView, ScoredAnswer};
pub use redemption::{RedemptionHistoryEntry, RedemptionRecord, Reward};
pub use scan::{VisitScan, decode_visit_scan};
pub use venue::{GeoPoint, NewAttendanceLog, Venue, VisitHistoryEntry};
