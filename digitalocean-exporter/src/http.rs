//! HTTP server for the metrics endpoint.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::registry::SharedRegistry;

/// Content type of the metrics exposition.
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Liveness endpoint; never touches a collector.
pub const HEALTH_PATH: &str = "/healthz";

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    registry: SharedRegistry,
    metrics_path: String,
}

/// Create the HTTP router.
pub fn create_router(registry: SharedRegistry, metrics_path: &str) -> Router {
    let state = AppState {
        registry,
        metrics_path: metrics_path.to_string(),
    };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route(HEALTH_PATH, get(health_handler))
        .route("/", get(index_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint; runs a full scrape.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    debug!("Scrape started");
    let body = state.registry.render().await;

    (
        StatusCode::OK,
        [(CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

async fn health_handler() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        concat!(
            "<html>\n",
            "<head><title>DigitalOcean Exporter</title></head>\n",
            "<body>\n",
            "<h1>DigitalOcean Exporter</h1>\n",
            "<p><a href=\"{metrics}\">Metrics</a></p>\n",
            "<p><a href=\"{health}\">Health</a></p>\n",
            "</body>\n",
            "</html>\n"
        ),
        metrics = state.metrics_path,
        health = HEALTH_PATH,
    ))
}

/// HTTP server configuration.
pub struct HttpServer {
    registry: SharedRegistry,
    listen_addr: String,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(registry: SharedRegistry, listen_addr: String, metrics_path: String) -> Self {
        Self {
            registry,
            listen_addr,
            metrics_path,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let router = create_router(self.registry, &self.metrics_path);

        let listener = tokio::net::TcpListener::bind(self.listen_addr.as_str())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        info!(
            addr = %self.listen_addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{BuildInfo, ExporterCollector};
    use crate::error_counter::ErrorCounter;
    use crate::registry::CollectorRegistry;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::Utc;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn make_registry() -> SharedRegistry {
        let registry = CollectorRegistry::builder(ErrorCounter::new())
            .register(ExporterCollector::new(BuildInfo::current(), Utc::now()))
            .unwrap()
            .build();
        Arc::new(registry)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let router = create_router(make_registry(), "/metrics");

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap(),
            OPENMETRICS_CONTENT_TYPE
        );

        let body = body_text(response).await;
        assert!(body.contains("digitalocean_exporter_build_info{"));
        assert!(body.contains("digitalocean_errors_total{collector=\"exporter\"} 0"));
        assert!(body.ends_with("# EOF\n"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = create_router(make_registry(), "/metrics");

        let response = router
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_index_links_metrics_path() {
        let router = create_router(make_registry(), "/do/metrics");

        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("href=\"/do/metrics\""));
        assert!(body.contains("href=\"/healthz\""));
    }

    #[tokio::test]
    async fn test_server_binds_host_name() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = HttpServer::new(
            make_registry(),
            "localhost:0".to_string(),
            "/metrics".to_string(),
        );

        let task = tokio::spawn(server.run(shutdown_rx));
        shutdown_tx.send(true).unwrap();

        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_server_reports_bind_failure() {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = HttpServer::new(
            make_registry(),
            "127.0.0.1:99999".to_string(),
            "/metrics".to_string(),
        );

        let error = server.run(shutdown_rx).await.unwrap_err();
        assert!(error.to_string().contains("Failed to bind to 127.0.0.1:99999"));
    }

    #[tokio::test]
    async fn test_custom_metrics_path() {
        let router = create_router(make_registry(), "/prometheus/metrics");

        let response = router
            .clone()
            .oneshot(
                Request::get("/prometheus/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
