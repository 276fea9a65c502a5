pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::repository::ReviewRepository;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<ReviewRepository>,
}

/// Build the router with all review-board endpoints.
pub fn build_router(config: &Config, repo: Arc<ReviewRepository>) -> Router {
    // Leave headroom above the upload limit for the other multipart fields;
    // the attachment store enforces the exact byte limit itself.
    let body_limit = config.uploads.max_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/reviews", get(handlers::list).post(handlers::submit))
        .route(
            "/reviews/:id",
            get(handlers::show)
                .put(handlers::edit)
                .delete(handlers::remove),
        )
        .nest_service("/uploads", ServeDir::new(&config.storage.upload_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { repo })
}

/// Start serving requests.
pub async fn serve(config: &Config, repo: Arc<ReviewRepository>) -> Result<()> {
    let app = build_router(config, repo);
    let listener = TcpListener::bind(config.server.bind_addr).await?;

    info!("Listening on {}", config.server.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
