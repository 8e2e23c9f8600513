//! Demo HTTP server.
//!
//! # Responsibilities
//! - Create the Axum Router with the demo handler
//! - Wire up middleware (request id, request context, tracing)
//! - Serve until the shutdown future resolves

use std::future::Future;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::http::request::{bind_request_context, BodyLimit};
use crate::logger::Logger;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct DemoState {
    pub logger: Logger,
}

/// HTTP server exposing `POST /api/v1/test`.
pub struct DemoServer {
    router: Router,
    config: ServerConfig,
}

impl DemoServer {
    /// Create a new server writing through `logger`.
    pub fn new(config: ServerConfig, logger: Logger) -> Self {
        let router = Self::build_router(&config, DemoState { logger });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: DemoState) -> Router {
        Router::new()
            .route("/api/v1/test", post(test_request_id))
            .with_state(state)
            .layer(middleware::from_fn_with_state(
                BodyLimit(config.max_body_bytes),
                bind_request_context,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` completes.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Demo server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Demo server stopped");
        Ok(())
    }
}

/// Log a test message under the request's ambient context and echo its id.
async fn test_request_id(State(state): State<DemoState>, body: Bytes) -> Response {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            state.logger.exception("Malformed request body", &e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let request_id = payload
        .get("request_id")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    state
        .logger
        .info(format!("{} this is test message", Uuid::new_v4().simple()));

    Json(json!({ "request_id": request_id })).into_response()
}

/// Wait for Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
