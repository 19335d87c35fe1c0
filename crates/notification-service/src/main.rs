//! 通知分发服务入口
//!
//! 加载配置、初始化可观测性与存储，启动 HTTP 服务。

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use dispatch_shared::{
    config::AppConfig,
    database::Database,
    observability::{self, middleware as obs_middleware},
};
use notification_dispatch::{
    channels::ChannelRouter,
    repository::{
        InMemoryNotificationRepository, InMemoryPreferencesRepository, InMemoryTokenRepository,
        PgNotificationRepository, PgPreferencesRepository, PgTokenRepository,
    },
    routes,
    service::NotificationService,
    state::AppState,
};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "notification-dispatch";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        "Starting {} on {}",
        config.service_name,
        config.server_addr()
    );

    let channels = ChannelRouter::from_config(&config.push);
    info!(channels = ?channels, "推送渠道已初始化");

    // 数据库地址为空时使用内存仓储，仅用于本地开发
    let (service, database) = if config.database.url.is_empty() {
        if config.is_production() {
            anyhow::bail!("生产环境必须配置 database.url");
        }
        warn!("未配置数据库，使用内存仓储，重启后数据丢失");
        let service = NotificationService::new(
            Arc::new(InMemoryTokenRepository::new()),
            Arc::new(InMemoryPreferencesRepository::new()),
            Arc::new(InMemoryNotificationRepository::new()),
            channels,
        );
        (service, None)
    } else {
        let db = Database::connect(&config.database).await?;
        if config.database.run_migrations {
            db.run_migrations(&sqlx::migrate!("../../migrations")).await?;
        }
        let service = NotificationService::new(
            Arc::new(PgTokenRepository::new(db.pool().clone())),
            Arc::new(PgPreferencesRepository::new(db.pool().clone())),
            Arc::new(PgNotificationRepository::new(db.pool().clone())),
            channels,
        );
        (service, Some(db))
    };

    let service = service.with_page_sizes(
        config.dispatch.default_page_size,
        config.dispatch.max_page_size,
    );

    let mut state = AppState::new(Arc::new(service), config.service_name.clone());
    if let Some(db) = database.clone() {
        state = state.with_database(db);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::app_router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 收到 SIGTERM 或 Ctrl+C 后停止接收新连接，等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// 监听关闭信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
