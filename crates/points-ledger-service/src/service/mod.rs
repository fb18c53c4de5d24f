//! 服务层
//!
//! ## 模块结构
//!
//! - `event_recorder`: 入账事件记录（打卡 / 答题）
//! - `balance_service`: 余额计算与明细
//! - `redemption_gate`: 奖品兑换
//! - `quiz_coordinator`: 单题与批量答题
//! - `scan_gate`: 扫码入口（解码 + 打卡入账 + 到访记录）
//! - `history_service`: 历史查询（只读）
//!
//! 依赖顺序：入账记录 -> 余额 -> 兑换 / 答题

pub mod balance_service;
pub mod dto;
pub mod event_recorder;
pub mod history_service;
pub mod quiz_coordinator;
pub mod redemption_gate;
pub mod scan_gate;

use std::sync::Arc;

use sqlx::PgPool;

use engagement_shared::config::LedgerConfig;

use crate::notification::NotificationSender;
use crate::repository::{
    AccrualRepository, AttendanceRepository, QuizSubmissionRepository, RedemptionRepository,
    RegistryRepository, RegistryRepositoryTrait,
};

pub use balance_service::BalanceService;
pub use dto::*;
pub use event_recorder::EventRecorder;
pub use history_service::HistoryService;
pub use quiz_coordinator::QuizCoordinator;
pub use redemption_gate::RedemptionGate;
pub use scan_gate::ScanGate;

/// 账本服务集合
///
/// 所有服务共享同一个连接池与通知发送器
#[derive(Clone)]
pub struct LedgerServices {
    pub recorder: Arc<EventRecorder>,
    pub balance: Arc<BalanceService>,
    pub redemption: Arc<RedemptionGate>,
    pub quiz: Arc<QuizCoordinator>,
    pub scan: Arc<ScanGate>,
    pub history: Arc<HistoryService>,
}

impl LedgerServices {
    /// 使用数据库参考数据仓储构建
    pub fn new(pool: PgPool, config: &LedgerConfig, notifier: NotificationSender) -> Self {
        let registry: Arc<dyn RegistryRepositoryTrait> =
            Arc::new(RegistryRepository::new(pool.clone()));
        Self::with_registry(pool, registry, config, notifier)
    }

    pub fn with_registry(
        pool: PgPool,
        registry: Arc<dyn RegistryRepositoryTrait>,
        config: &LedgerConfig,
        notifier: NotificationSender,
    ) -> Self {
        let history = HistoryService::new(
            Arc::new(AccrualRepository::new(pool.clone())),
            Arc::new(AttendanceRepository::new(pool.clone())),
            Arc::new(RedemptionRepository::new(pool.clone())),
            Arc::new(QuizSubmissionRepository::new(pool.clone())),
            registry.clone(),
            config.clone(),
        );

        Self {
            recorder: Arc::new(EventRecorder::new(pool.clone(), config, notifier.clone())),
            balance: Arc::new(BalanceService::new(pool.clone())),
            redemption: Arc::new(RedemptionGate::new(
                pool.clone(),
                registry.clone(),
                config,
                notifier.clone(),
            )),
            quiz: Arc::new(QuizCoordinator::new(
                pool.clone(),
                registry.clone(),
                config,
                notifier.clone(),
            )),
            scan: Arc::new(ScanGate::new(pool, registry, config, notifier)),
            history: Arc::new(history),
        }
    }
}
