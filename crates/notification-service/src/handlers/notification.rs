//! 通知 API 处理器
//!
//! 包含业务侧的发送入口以及展示层的通知列表、已读和删除操作

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, ListQuery, MarkAllReadResponse, SendNotificationRequest,
        SendNotificationResponse, UnreadCountResponse,
    },
    error::DispatchError,
    models::NotificationView,
    state::AppState,
};

/// 发送通知
///
/// POST /api/v1/notifications/send
///
/// 策略拒绝和无设备返回 422，请求体中的错误码区分原因
pub async fn send_notification(
    State(state): State<AppState>,
    Json(req): Json<SendNotificationRequest>,
) -> Result<Json<ApiResponse<SendNotificationResponse>>, DispatchError> {
    req.validate()?;

    let notification_id = state.service.send_notification(req.into()).await?;

    info!(notification_id = %notification_id, "通知已分发");
    Ok(Json(ApiResponse::success(SendNotificationResponse {
        notification_id,
    })))
}

/// 获取用户通知列表
///
/// GET /api/v1/users/{user_id}/notifications?limit=N
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationView>>>, DispatchError> {
    let items = state
        .service
        .get_notifications(&user_id, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// 获取用户未读通知
///
/// GET /api/v1/users/{user_id}/notifications/unread
pub async fn list_unread_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<NotificationView>>>, DispatchError> {
    let items = state.service.get_unread_notifications(&user_id).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// 获取用户未读数
///
/// GET /api/v1/users/{user_id}/notifications/unread-count
pub async fn get_unread_count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UnreadCountResponse>>, DispatchError> {
    let unread_count = state.service.get_unread_count(&user_id).await?;
    Ok(Json(ApiResponse::success(UnreadCountResponse {
        user_id,
        unread_count,
    })))
}

/// 全部标记已读
///
/// POST /api/v1/users/{user_id}/notifications/read-all
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<MarkAllReadResponse>>, DispatchError> {
    let marked = state.service.mark_all_as_read(&user_id).await?;
    Ok(Json(ApiResponse::success(MarkAllReadResponse { user_id, marked })))
}

/// 获取单条通知
///
/// GET /api/v1/notifications/{id}
pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationView>>, DispatchError> {
    let view = state.service.get_notification(id).await?;
    Ok(Json(ApiResponse::success(view)))
}

/// 标记单条已读
///
/// POST /api/v1/notifications/{id}/read
pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, DispatchError> {
    state.service.mark_as_read(id).await?;
    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 删除通知
///
/// DELETE /api/v1/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, DispatchError> {
    state.service.delete_notification(id).await?;
    Ok(Json(ApiResponse::<()>::success_empty()))
}
