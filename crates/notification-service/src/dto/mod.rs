//! HTTP 请求和响应的数据传输对象

pub mod request;
pub mod response;

pub use request::{ListQuery, RegisterTokenRequest, SendNotificationRequest, UpdatePreferencesRequest};
pub use response::{
    ApiResponse, HealthResponse, MarkAllReadResponse, SendNotificationResponse,
    UnreadCountResponse,
};
