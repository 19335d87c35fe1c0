//! 可观测性
//!
//! 分发服务启动时调用 [`init`]：先装日志与追踪，再按配置启动 Prometheus 导出。

pub mod metrics;
pub mod middleware;
pub mod tracing;

use ::tracing::info;
use anyhow::Result;
use serde::Deserialize;

/// `[observability]` 配置段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// 由 `AppConfig::service_name` 注入，配置文件中一般不写
    pub service_name: String,
    /// OTLP gRPC 端点，未配置时只输出本地日志
    pub otlp_endpoint: Option<String>,
    pub metrics_enabled: bool,
    /// `/metrics` 独立监听端口
    pub metrics_port: u16,
    /// `EnvFilter` 指令，`RUST_LOG` 优先
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "notification-dispatch".to_string(),
            otlp_endpoint: None,
            metrics_enabled: true,
            metrics_port: 9090,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ObservabilityConfig {
    pub fn with_service_name(mut self, service_name: &str) -> Self {
        self.service_name = service_name.to_string();
        self
    }
}

/// 持有指标服务任务和追踪 provider，drop 时刷新待导出的 span
pub struct ObservabilityGuard {
    _metrics: Option<metrics::MetricsHandle>,
    _tracing: tracing::TracingGuard,
}

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        info!("Shutting down observability...");
    }
}

/// 初始化日志、追踪与指标
pub async fn init(config: &ObservabilityConfig) -> Result<ObservabilityGuard> {
    let tracing_guard = tracing::init(config)?;

    let metrics_handle = if config.metrics_enabled {
        Some(metrics::init(config).await?)
    } else {
        None
    };

    info!(
        service = %config.service_name,
        metrics_enabled = config.metrics_enabled,
        metrics_port = config.metrics_port,
        otlp_endpoint = ?config.otlp_endpoint,
        "Observability initialized"
    );

    Ok(ObservabilityGuard {
        _metrics: metrics_handle,
        _tracing: tracing_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "notification-dispatch");
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.log_level, "info");
        assert!(config.metrics_enabled);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: ObservabilityConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "json_logs = true\nmetrics_port = 9100",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert!(config.json_logs);
        assert_eq!(config.metrics_port, 9100);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_with_service_name() {
        let config = ObservabilityConfig::default().with_service_name("dispatch-canary");
        assert_eq!(config.service_name, "dispatch-canary");
    }
}
