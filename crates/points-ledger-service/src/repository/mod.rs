//! 数据库仓储层
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 账本写入一律是 `*_in_tx` 函数，事务由服务层开启和提交
//! - 幂等写入使用条件插入，冲突时返回 None 而不是报错
//! - 参考数据查询定义 trait 接口以支持 mock 测试

mod accrual_repo;
mod attendance_repo;
mod quiz_repo;
mod redemption_repo;
mod registry_repo;
mod traits;

pub use accrual_repo::AccrualRepository;
pub use attendance_repo::AttendanceRepository;
pub use quiz_repo::QuizSubmissionRepository;
pub use redemption_repo::RedemptionRepository;
pub use registry_repo::RegistryRepository;
pub use traits::*;
