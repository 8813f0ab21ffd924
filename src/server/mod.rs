//! HTTP front for the review proxy.
//!
//! Routes:
//! - `POST /api/review/single` (multipart form: `id`, `text`, `photo`, `photo_file`)
//! - `POST /api/review/batch` (JSON `{"items": [...]}`)
//! - `GET  /api/health`

pub mod handlers;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::engine::ReviewEngine;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn ReviewEngine>,
    pub batch_delay: Duration,
}

impl AppState {
    pub fn new(engine: Arc<dyn ReviewEngine>, batch_delay: Duration) -> Self {
        Self {
            engine,
            batch_delay,
        }
    }
}

/// Build the router with CORS, tracing and the body limit applied.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/review/single", post(handlers::review_single))
        .route("/api/review/batch", post(handlers::review_batch))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve `app` on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run(config: &ServerConfig, engine: Arc<dyn ReviewEngine>) -> anyhow::Result<()> {
    let state = AppState::new(engine, config.batch_delay);
    let app = router(state, config.max_body_bytes);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("review proxy listening on {}", config.bind_addr);

    serve(listener, app, shutdown_signal()).await?;
    tracing::info!("review proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutting down review proxy..."),
        Err(e) => tracing::error!("failed to listen for ctrl_c: {:?}", e),
    }
}
