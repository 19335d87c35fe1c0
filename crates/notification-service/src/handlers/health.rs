//! 健康检查

use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use crate::{dto::HealthResponse, state::AppState};

/// 存活检查
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: state.service_name,
    })
}

/// 就绪检查，使用数据库时校验连接可用
///
/// GET /ready
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    if let Some(database) = &state.database {
        if let Err(e) = database.health_check().await {
            warn!(error = %e, "数据库健康检查失败");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    service: state.service_name,
                }),
            );
        }
    }

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ready",
            service: state.service_name,
        }),
    )
}
