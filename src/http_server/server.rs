//! # HTTP Server
//!
//! Combines the health and artifact routers into one Axum server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::StatusCode, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::observability::Event;

use super::artifact_routes::{artifact_routes, ArtifactState};
use super::config::HttpServerConfig;
use super::observability_routes::health_routes;

/// HTTP Server for the artifact store
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server serving `state` under the configured mount path.
    pub fn new(config: HttpServerConfig, state: ArtifactState) -> Self {
        let state = state.with_mount_path(config.normalized_mount_path());
        let router = Self::build_router(&config, Arc::new(state));
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, state: Arc<ArtifactState>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let mount = config.normalized_mount_path();
        let artifacts = artifact_routes(state);

        let router = Router::new().merge(health_routes());
        let router = if mount.is_empty() {
            router.merge(artifacts)
        } else {
            router.nest(&mount, artifacts)
        };

        router
            // Unknown routes get a bare 404, no body
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;

        tracing::info!(
            event = Event::Serving.as_str(),
            addr = %addr,
            mount = %self.config.normalized_mount_path(),
            "docvault listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
