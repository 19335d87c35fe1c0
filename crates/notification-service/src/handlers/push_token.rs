//! 推送 token API 处理器
//!
//! 客户端登录或 token 刷新时注册，登出时注销

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, RegisterTokenRequest},
    error::DispatchError,
    models::Platform,
    state::AppState,
};

/// 注册推送 token
///
/// PUT /api/v1/users/{user_id}/push-tokens/{platform}
pub async fn register_push_token(
    State(state): State<AppState>,
    Path((user_id, platform)): Path<(String, String)>,
    Json(req): Json<RegisterTokenRequest>,
) -> Result<Json<ApiResponse<()>>, DispatchError> {
    req.validate()?;
    let platform: Platform = platform.parse()?;

    state
        .service
        .register_push_token(&user_id, platform, &req.token)
        .await?;

    info!(user_id = %user_id, platform = %platform, "注册推送 token");
    Ok(Json(ApiResponse::<()>::success_empty()))
}

/// 注销推送 token
///
/// DELETE /api/v1/users/{user_id}/push-tokens/{platform}
pub async fn unregister_push_token(
    State(state): State<AppState>,
    Path((user_id, platform)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, DispatchError> {
    let platform: Platform = platform.parse()?;

    state
        .service
        .unregister_push_token(&user_id, platform)
        .await?;

    Ok(Json(ApiResponse::<()>::success_empty()))
}
