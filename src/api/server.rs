//! HTTP Server implementation
//!
//! This module provides the HTTP server using Axum framework with:
//! - Configurable host/port binding
//! - Graceful shutdown handling
//! - Request timeouts
//! - Health check endpoint
//! - CORS support

use crate::api::handlers::{health_check, AppState};
use crate::api::middleware::{
    security_headers_middleware, trace_id_middleware, SecurityHeadersConfig,
};
use crate::api::routes::build_api_routes;
use crate::auth::middleware::access_gate;
use crate::core::config::{Config, SecurityConfig, ServerConfig};
use crate::core::error::{ErrorResponse, ShopError};
use axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    BoxError, Json, Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// HTTP API Server
pub struct ApiServer {
    router: Router,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new API server over prepared application state
    pub fn new(config: &Config, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
            config: config.server.clone(),
        }
    }

    /// Build the Axum router with all routes and middleware
    fn build_router(config: &Config, state: AppState) -> Router {
        let security_headers_config = SecurityHeadersConfig::new(
            config.security.enable_hsts,
            config.security.hsts_max_age,
        );
        let request_timeout = Duration::from_secs(config.server.request_timeout);

        // The gate wraps the fallback too, so unknown paths need an identity
        Router::new()
            .route("/health", get(health_check))
            .with_state(state.clone())
            .nest("/api", build_api_routes(state.clone()))
            .fallback(route_not_found)
            .layer(middleware::from_fn_with_state(state, access_gate))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn_with_state(
                        security_headers_config,
                        security_headers_middleware,
                    ))
                    .layer(middleware::from_fn(trace_id_middleware))
                    .layer(TraceLayer::new_for_http())
                    .layer(Self::build_cors_layer(&config.security))
                    .layer(HandleErrorLayer::new(handle_timeout_error))
                    .timeout(request_timeout),
            )
    }

    /// Build CORS layer from the security configuration
    ///
    /// A `*` entry accepts every origin by mirroring it back, which stays
    /// valid when credentials are allowed.
    fn build_cors_layer(security: &SecurityConfig) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(AllowHeaders::mirror_request())
            .expose_headers([HeaderName::from_static("x-trace-id")])
            .allow_credentials(security.allow_credentials);

        if security.allows_any_origin() {
            return cors.allow_origin(AllowOrigin::mirror_request());
        }

        let origins: Vec<HeaderValue> = security
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        cors.allow_origin(origins)
    }

    /// Start the HTTP server and listen for requests
    ///
    /// This method will block until the server is shut down gracefully.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr.parse()?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            request_timeout = self.config.request_timeout,
            "Starting HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(socket_addr).await?;

        info!(addr = %socket_addr, "HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");

        Ok(())
    }

    /// Get a reference to the router
    pub fn router(&self) -> &Router {
        &self.router
    }
}

async fn route_not_found() -> ShopError {
    ShopError::NotFound("Route not found".to_string())
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, Json<ErrorResponse>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("Request timed out");
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorResponse::new(
                "TimeoutError".to_string(),
                "Request took too long".to_string(),
            )),
        )
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(
                "InternalError".to_string(),
                err.to_string(),
            )),
        )
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown...");
}
