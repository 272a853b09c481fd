//! HTTP API consumed by the contribution front end

mod error;
pub mod handlers;

pub use error::{ApiError, ErrorBody, kind_for, status_for};

use crate::config::PortalConfig;
use crate::error::Result;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Portal configuration
    pub config: Arc<PortalConfig>,
}

impl AppState {
    /// Wrap a configuration for sharing across handlers
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &PortalConfig) -> CorsLayer {
    let Some(origin) = config.allowed_origin.as_deref() else {
        return CorsLayer::permissive();
    };
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(value))
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(origin, "invalid allowed origin, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/create-branch", post(handlers::create_branch))
        .route("/commit-folder", post(handlers::commit_folder))
        .route("/submit", post(handlers::submit))
        .route("/manage/forks", get(handlers::sync_fork))
        .route("/manage/pulls", get(handlers::list_pulls))
        .route("/branches", post(handlers::list_branches))
        .route("/delete-branch", post(handlers::delete_branch))
        .route("/promote-pr", post(handlers::promote_pr))
        .route("/api/load-file", get(handlers::load_file))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Bind `listen_addr` and serve until Ctrl-C
pub async fn serve(config: PortalConfig) -> Result<()> {
    let listen_addr = config.listen_addr.clone();
    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
