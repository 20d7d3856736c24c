//! Server Implementation
//!
//! Builds the router with its middleware and runs the HTTP server

use std::time::Duration;

use axum::Router;
use axum::middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::auth::require_auth;
use crate::core::{Config, ServerState};
use crate::utils::AppError;

/// How often expired sessions are pruned
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(600);

/// Custom request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Public
        .merge(api::health::router())
        .merge(api::password_resets::router())
        // Authenticated
        .merge(api::me::router())
        .merge(api::members::router())
        .merge(api::groups::router())
        .merge(api::slots::router())
        .merge(api::payments::router())
        .merge(api::banks::router())
        .merge(api::messages::router())
        // Admin
        .merge(api::analytics::router())
        .merge(api::auth_logs::router())
        .merge(api::users::router())
}

/// Build a fully configured application with all middleware and state
///
/// Used by both the HTTP server and the integration tests.
pub fn build_app(state: ServerState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    build_router()
        // JWT authentication - injects CurrentUser before routes run
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, XRequestId))
        .with_state(state)
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        self.spawn_session_pruner();

        let app = build_app(self.state.clone());
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::config(format!("Failed to bind {addr}: {e}")))?;

        tracing::info!("Kasmoni server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        self.state.pool.close().await;
        tracing::info!("Server stopped");
        Ok(())
    }

    fn spawn_session_pruner(&self) {
        let sessions = self.state.sessions.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SESSION_PRUNE_INTERVAL);
            loop {
                ticker.tick().await;
                let removed = sessions.prune_expired(chrono::Utc::now().timestamp());
                if removed > 0 {
                    tracing::debug!(removed, "Pruned expired sessions");
                }
            }
        });
    }
}
