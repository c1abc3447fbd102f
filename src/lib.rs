//! Shelf: a read-only HTTP API over a scraped product catalog.
//!
//! The catalog is a JSON document written by an external scraper, optionally
//! accompanied by price snapshots. It is loaded into an immutable in-memory
//! snapshot and served through a bounded listing and a case-insensitive
//! name search.

pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use routes::create_router;
pub use state::{AppState, CatalogHandle, CatalogSource, CatalogStatus};
