//! 可观测性模块集成测试
//!
//! 测试 metrics 记录函数和 HTTP 中间件的核心行为。

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use dispatch_shared::observability::metrics::{
        record_http_request, record_notification_dispatched, record_notification_rejected,
        record_push_send,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/v1/users/{user_id}/notifications", 200, 0.05);
        record_http_request("POST", "/api/v1/notifications/send", 422, 0.01);
        record_http_request("DELETE", "/api/v1/notifications/{id}", 200, 0.02);
    }

    #[test]
    fn test_record_dispatch_metrics() {
        record_notification_dispatched("MENTION", 2, 0.04);
        record_notification_dispatched("MEETING_REMINDER", 0, 0.0);
        record_notification_dispatched("PAYMENT_DUE", 50, 1.5);
        record_notification_rejected("NEW_COMMENT", "quiet_hours");
        record_notification_rejected("VOTE_REMINDER", "type_disabled");
        record_notification_rejected("MENTION", "no_tokens");
        record_push_send("ANDROID", "success");
        record_push_send("IOS", "failed");
    }
}

// ============================================================================
// 中间件测试
// ============================================================================

mod middleware_tests {
    use axum::{
        Extension, Router,
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
    };
    use dispatch_shared::observability::middleware::{RequestId, http_tracing, request_id};
    use tower::ServiceExt;

    async fn echo_request_id(Extension(id): Extension<RequestId>) -> String {
        id.as_str().to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", get(echo_request_id))
            .layer(middleware::from_fn(http_tracing))
            .layer(middleware::from_fn(request_id))
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-123");
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = app()
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let generated = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(generated).is_ok());
    }

    #[tokio::test]
    async fn test_unmatched_route_passes_through() {
        let response = app()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_request_id_clone() {
        let id = RequestId("abc".to_string());
        assert_eq!(id.clone().as_str(), "abc");
    }
}

// ============================================================================
// 配置测试
// ============================================================================

mod config_tests {
    use dispatch_shared::observability::ObservabilityConfig;

    #[test]
    fn test_config_overrides_and_service_name() {
        let config = ObservabilityConfig {
            service_name: "notification-dispatch".to_string(),
            otlp_endpoint: Some("http://localhost:4317".to_string()),
            metrics_enabled: false,
            metrics_port: 9100,
            log_level: "debug".to_string(),
            json_logs: true,
        };
        assert_eq!(config.metrics_port, 9100);
        assert!(config.otlp_endpoint.is_some());

        let renamed = config.with_service_name("dispatch-canary");
        assert_eq!(renamed.service_name, "dispatch-canary");
        assert_eq!(renamed.metrics_port, 9100);
    }
}
