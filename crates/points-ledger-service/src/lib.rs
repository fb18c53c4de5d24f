//! 积分账本服务
//!
//! 访客通过场馆扫码打卡、答题获得积分，再用积分兑换奖品。
//!
//! ## 核心功能
//!
//! - **入账记录**：打卡与答对题目写入只追加的账本，每个访客每个场馆每天最多一次打卡
//! - **余额计算**：余额 = 入账合计 - 兑换消耗合计，不单独存储
//! - **奖品兑换**：同一访客的兑换串行执行，余额不会被透支
//! - **答题协调**：单题与批量提交，每题每访客只能提交一次
//! - **扫码入口**：解码打卡二维码，入账并写入到访记录
//! - **历史查询**：积分、到访、兑换历史
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层
//! - `notification`: 账本事件通知
//! - `http`: REST 接入层

pub mod error;
pub mod http;
pub mod models;
pub mod notification;
pub mod repository;
pub mod service;

use sqlx::migrate::Migrator;

pub use error::{LedgerError, Result};
pub use models::*;
pub use notification::{LedgerEvent, NotificationSender, NotificationSink};
pub use repository::{
    AccrualRepository, AttendanceRepository, QuizSubmissionRepository, RedemptionRepository,
    RegistryRepository, RegistryRepositoryTrait,
};
pub use service::{
    BalanceService, EventRecorder, HistoryService, LedgerServices, QuizCoordinator,
    RedemptionGate, ScanGate, dto,
};

/// 内置数据库迁移
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
