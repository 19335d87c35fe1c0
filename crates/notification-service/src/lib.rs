//! 通知分发服务
//!
//! 决定一条推送通知是否、何时、经由哪个渠道送达用户，
//! 持久化通知记录并跟踪已读状态。
//!
//! ## 核心功能
//!
//! - **设备注册**：每个用户每个平台至多一个推送 token
//! - **通知偏好**：启用类型、免打扰时段，未设置时使用默认偏好
//! - **分发策略**：类型过滤 + 免打扰（紧急类型不受免打扰限制）
//! - **多设备推送**：FCM / APNs 并行投递，单设备失败互不影响
//! - **通知历史**：按用户查询、未读数、已读、删除
//!
//! ## 模块结构
//!
//! - `models`: 领域模型与枚举
//! - `policy`: 分发策略判定
//! - `repository`: 仓储接口及 PostgreSQL / 内存实现
//! - `channels`: 推送渠道
//! - `service`: 分发编排
//! - `dto` / `handlers` / `routes` / `state`: HTTP 接口
//! - `error`: 错误类型定义

pub mod channels;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

pub use channels::{ChannelRouter, DeliveryReceipt, PushChannel, PushMessage};
pub use error::{DispatchError, Result};
pub use models::{
    NotificationPreferences, NotificationRecord, NotificationRequest, NotificationType,
    NotificationView, Platform, PublicNotificationType, PushToken, QuietHours, QuietTime,
};
pub use policy::{DenyReason, PolicyDecision};
pub use service::NotificationService;
