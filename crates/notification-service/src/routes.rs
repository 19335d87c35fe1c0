//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{handlers, state::AppState};

/// 推送 token 路由（客户端调用）
fn push_token_routes() -> Router<AppState> {
    Router::new().route(
        "/users/{user_id}/push-tokens/{platform}",
        put(handlers::push_token::register_push_token)
            .delete(handlers::push_token::unregister_push_token),
    )
}

/// 通知路由
///
/// 包含业务侧发送入口和展示层查询
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications/send",
            post(handlers::notification::send_notification),
        )
        .route(
            "/notifications/{id}",
            get(handlers::notification::get_notification)
                .delete(handlers::notification::delete_notification),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::notification::mark_as_read),
        )
        .route(
            "/users/{user_id}/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/users/{user_id}/notifications/unread",
            get(handlers::notification::list_unread_notifications),
        )
        .route(
            "/users/{user_id}/notifications/unread-count",
            get(handlers::notification::get_unread_count),
        )
        .route(
            "/users/{user_id}/notifications/read-all",
            post(handlers::notification::mark_all_as_read),
        )
}

/// 通知偏好路由
fn preferences_routes() -> Router<AppState> {
    Router::new().route(
        "/users/{user_id}/preferences",
        get(handlers::preferences::get_preferences).put(handlers::preferences::update_preferences),
    )
}

/// 构建 /api/v1 下的全部路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(push_token_routes())
        .merge(notification_routes())
        .merge(preferences_routes())
}

/// 构建完整应用路由（不含中间件）
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api/v1", api_routes())
        .with_state(state)
}
