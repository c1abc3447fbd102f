//! HTTP server startup logic.

use std::net::SocketAddr;

use axum::Router;
use axum_server::Handle;

use crate::config::AppConfig;
use crate::state::CatalogHandle;

use super::shutdown;

/// Server startup error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid http.host or http.port: {0}")]
    Address(String),

    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Resolve the configured bind address.
pub fn bind_address(config: &AppConfig) -> Result<SocketAddr, ServerError> {
    format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .map_err(|e| ServerError::Address(format!("{}:{} ({})", config.http.host, config.http.port, e)))
}

/// Start the HTTP server and serve until SIGINT/SIGTERM.
///
/// SIGHUP reloads the catalog from disk while serving.
pub async fn start_server(
    app: Router,
    config: &AppConfig,
    catalog: CatalogHandle,
) -> Result<(), ServerError> {
    let addr = bind_address(config)?;
    let handle = Handle::new();

    tracing::info!(%addr, "Starting HTTP server");

    shutdown::setup_shutdown_handler(handle.clone());
    shutdown::setup_reload_handler(catalog);

    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
