//! Health check endpoint for container orchestration.
//!
//! Reports whether a catalog snapshot is loaded. Returns 200 when ready and
//! 503 when the catalog is unavailable, so the same endpoint works as a
//! readiness probe.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::{AppState, CatalogStatus};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `"ok"` or `"unavailable"`
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub version: &'static str,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION");
    match state.catalog.status().await {
        CatalogStatus::Ready(catalog) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                products: Some(catalog.len()),
                loaded_at: Some(catalog.loaded_at()),
                detail: None,
                version,
            }),
        ),
        CatalogStatus::Unavailable { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
                products: None,
                loaded_at: None,
                detail: Some(reason),
                version,
            }),
        ),
    }
}
