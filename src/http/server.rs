//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the content handler
//! - Wire up middleware (tracing, timeout, response headers)
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::middleware::{with_response_headers, HeaderManager};

/// HTTP server hosting the response header middleware.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(config: ServerConfig, manager: Arc<HeaderManager>) -> Self {
        let router = Self::build_router(&config, manager);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, manager: Arc<HeaderManager>) -> Router {
        let content = match &config.static_root {
            Some(root) => Router::new().fallback_service(ServeDir::new(root)),
            None => Router::new().fallback(default_handler),
        };

        with_response_headers(content, manager).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs))),
        )
    }

    /// The router, for embedding or driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn default_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
