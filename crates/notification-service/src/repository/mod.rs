//! 数据仓储层
//!
//! 提供推送 token、通知偏好和通知记录的数据访问接口。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含策略判断
//! - PostgreSQL 实现使用 SQLx，内存实现使用 DashMap
//! - 定义 trait 接口以支持 mock 测试

mod memory;
mod notification_repo;
mod preferences_repo;
mod token_repo;
mod traits;

pub use memory::{
    InMemoryNotificationRepository, InMemoryPreferencesRepository, InMemoryTokenRepository,
};
pub use notification_repo::PgNotificationRepository;
pub use preferences_repo::PgPreferencesRepository;
pub use token_repo::PgTokenRepository;
pub use traits::*;
