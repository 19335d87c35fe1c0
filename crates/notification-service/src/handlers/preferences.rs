//! 通知偏好 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    dto::{ApiResponse, UpdatePreferencesRequest},
    error::DispatchError,
    models::NotificationPreferences,
    state::AppState,
};

/// 获取通知偏好，未设置过时返回默认值
///
/// GET /api/v1/users/{user_id}/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<NotificationPreferences>>, DispatchError> {
    let preferences = state.service.get_preferences(&user_id).await?;
    Ok(Json(ApiResponse::success(preferences)))
}

/// 整体替换通知偏好
///
/// PUT /api/v1/users/{user_id}/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<ApiResponse<NotificationPreferences>>, DispatchError> {
    let saved = state
        .service
        .update_preferences(req.into_preferences(user_id))
        .await?;
    Ok(Json(ApiResponse::success(saved)))
}
