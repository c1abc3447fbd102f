//! Shelf: a product catalog API.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration, loads the catalog, sets up the Axum router and starts the
//! HTTP server.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelf::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use shelf::http::start_server;
use shelf::{create_router, AppState, CatalogHandle, CatalogSource};

/// Shelf: A read-only HTTP API over a scraped product catalog
#[derive(Parser, Debug)]
#[command(name = "shelf", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Products JSON document (overrides config and PRODUCTS_JSON_PATH)
    #[arg(short, long)]
    products: Option<PathBuf>,

    /// Log level filter (e.g., "shelf=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> Result<AppConfig, Box<dyn std::error::Error>> {
    // An explicit --config must exist; the default path is optional
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(DEFAULT_CONFIG_PATH)?,
    };
    config.apply_env()?;
    if let Some(products) = &args.products {
        config.catalog.products_path = products.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        host = %config.http.host,
        port = config.http.port,
        products = %config.catalog.products_path.display(),
        price_snapshots = %config.catalog.price_snapshots_path().display(),
        "Loaded configuration"
    );

    let source = CatalogSource::from_config(&config.catalog);
    let catalog = CatalogHandle::open(source, config.catalog.require_on_startup).await?;

    let state = AppState::new(config.clone(), catalog.clone());
    let app = create_router(state);

    start_server(app, &config, catalog).await?;

    Ok(())
}
