//! 通知分发错误类型
//!
//! 区分可预期的业务结果（策略拒绝、无设备）与基础设施故障（存储不可用）。
//! 单设备推送失败同样有对应变体，但编排层只记录日志和指标，不向上传播。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Platform;
use crate::policy::DenyReason;

/// 通知分发错误
#[derive(Debug, Error)]
pub enum DispatchError {
    // === 可预期的分发结果 ===
    #[error("通知被策略拒绝: {0}")]
    PolicyRejected(DenyReason),

    #[error("用户未注册任何推送设备: user_id={user_id}")]
    NoTokensRegistered { user_id: String },

    // === 单设备推送 ===
    #[error("推送发送失败: platform={platform}, token={}, 原因={reason}", mask_token(token))]
    ChannelSendFailed {
        platform: Platform,
        token: String,
        reason: String,
    },

    // === 查询 ===
    #[error("通知不存在: {0}")]
    NotificationNotFound(Uuid),

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("存储不可用: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 通知分发 Result 类型别名
pub type Result<T> = std::result::Result<T, DispatchError>;

/// 日志中只保留 token 首尾各 6 位
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}…{tail}")
}

impl DispatchError {
    /// 检查调用方整体重试是否有意义
    ///
    /// 单设备推送失败只记录，不重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_) | Self::Internal(_))
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PolicyRejected(_) => "POLICY_REJECTED",
            Self::NoTokensRegistered { .. } => "NO_TOKENS_REGISTERED",
            Self::ChannelSendFailed { .. } => "CHANNEL_SEND_FAILED",
            Self::NotificationNotFound(_) => "NOTIFICATION_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::PolicyRejected(_) | Self::NoTokensRegistered { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotificationNotFound(_) => StatusCode::NOT_FOUND,
            Self::ChannelSendFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::StoreUnavailable(e) => {
                tracing::error!(error = %e, "存储操作失败");
                "服务暂不可用，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for DispatchError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
