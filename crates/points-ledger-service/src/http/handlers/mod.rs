//! HTTP 处理器

pub mod balance;
pub mod health;
pub mod history;
pub mod quiz;
pub mod redemption;
pub mod scan;
