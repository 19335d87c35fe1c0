//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use dispatch_shared::database::Database;

use crate::service::NotificationService;

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 通知分发服务
    pub service: Arc<NotificationService>,
    /// 数据库连接池，使用内存仓储时为空
    pub database: Option<Database>,
    /// 服务名（健康检查返回）
    pub service_name: String,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(service: Arc<NotificationService>, service_name: impl Into<String>) -> Self {
        Self {
            service,
            database: None,
            service_name: service_name.into(),
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}
