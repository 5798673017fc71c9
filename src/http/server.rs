//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (CORS, request ID, tracing, inbound deadline)
//! - Bind server to listener with graceful shutdown
//!
//! The router returned by [`build_router`] is a plain tower service, so a
//! serverless host can drive it one request at a time with `oneshot`, while
//! [`HttpServer`] runs the same router as a long-lived process.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    routing::{any, get},
    BoxError, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::forwarder::{Forwarder, SetupError};
use crate::http::cors;
use crate::http::handlers::{
    fallback_handler, handle_middleware_error, health_handler, index_handler, proxy_handler,
};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> Result<Self, SetupError> {
        Ok(Self {
            forwarder: Arc::new(Forwarder::new(&config.upstream)?),
        })
    }
}

/// Build the complete relay router for a configuration.
pub fn build_router(config: &RelayConfig) -> Result<Router, SetupError> {
    let state = AppState::new(config)?;
    Ok(router_with_state(config, state))
}

/// Build the Axum router with all middleware layers.
pub fn router_with_state(config: &RelayConfig, state: AppState) -> Router {
    let deadline = Duration::from_secs(config.timeouts.request_secs);
    let router = Router::new()
        .route("/proxy", any(proxy_handler))
        .route("/", get(index_handler).fallback(fallback_handler))
        .route("/health", get(health_handler).fallback(fallback_handler))
        .fallback(fallback_handler)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| {
                    handle_middleware_error(err, deadline)
                }))
                .layer(TimeoutLayer::new(deadline)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        );

    cors::apply(router)
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, SetupError> {
        let router = build_router(&config)?;
        Ok(Self { router, config })
    }

    /// Run the server until `shutdown_rx` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
