//! HTTP API over the catalog.

pub mod error;
pub mod handlers;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::Catalog;
use error::AppError;

/// Shared handler state. The catalog has a single connection, so requests
/// take turns on it.
#[derive(Clone)]
pub struct AppState {
    catalog: Arc<Mutex<Catalog>>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
        }
    }

    pub fn catalog(&self) -> Result<MutexGuard<'_, Catalog>, AppError> {
        self.catalog
            .lock()
            .map_err(|_| AppError::internal("catalog lock poisoned"))
    }
}

pub fn router(state: AppState, debug: bool) -> Router {
    let router = Router::new()
        .route("/image/count", get(handlers::get_image_count))
        .route("/image/{image_id}", get(handlers::get_image))
        .route("/image/{image_id}/tag", get(handlers::get_image_tags))
        .route(
            "/image/{image_id}/tag/{tag_name}",
            post(handlers::add_image_tag).delete(handlers::remove_image_tag),
        )
        .route("/tag", get(handlers::get_tags))
        .route("/dataset", get(handlers::get_dataset))
        .route("/admin/{table}", get(handlers::export_table))
        .with_state(state);

    if debug {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Bind `ip:port` and serve until Ctrl-C.
pub async fn serve(ip: &str, port: u16, state: AppState, debug: bool) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((ip, port))
        .await
        .with_context(|| format!("binding {ip}:{port}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state, debug))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
