//! Application setup: state construction, routes and the server loop.

pub mod routes;
pub mod server;

use crate::state::AppState;
use axum::Router;
use depot_core::Config;
use std::sync::Arc;

/// Build the shared state and the fully layered router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router), anyhow::Error> {
    tracing::info!(
        environment = %config.environment,
        storage_dir = %config.storage_dir.display(),
        "Initializing application"
    );

    let state = Arc::new(AppState::new(config.clone()));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
