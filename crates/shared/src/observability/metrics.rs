//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!(
        "notifications_dispatched_total",
        "Notifications persisted and fanned out to devices"
    );
    metrics::describe_counter!(
        "notifications_rejected_total",
        "Notifications rejected before dispatch"
    );
    metrics::describe_histogram!(
        "notification_dispatch_duration_seconds",
        "Duration of a single sendNotification call in seconds"
    );
    metrics::describe_counter!(
        "push_sends_total",
        "Per-device push send attempts by platform and status"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录一次成功的通知分发（记录已持久化）
#[inline]
pub fn record_notification_dispatched(notification_type: &str, device_count: usize, duration_secs: f64) {
    metrics::counter!(
        "notifications_dispatched_total",
        "type" => notification_type.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "notification_dispatch_duration_seconds",
        "type" => notification_type.to_string(),
        "devices" => device_count.min(10).to_string()
    )
    .record(duration_secs);
}

/// 记录一次被拒绝的通知（策略拒绝或无设备）
#[inline]
pub fn record_notification_rejected(notification_type: &str, reason: &str) {
    metrics::counter!(
        "notifications_rejected_total",
        "type" => notification_type.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// 记录单设备推送结果
#[inline]
pub fn record_push_send(platform: &str, status: &str) {
    metrics::counter!(
        "push_sends_total",
        "platform" => platform.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
