//! Shared application state for request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::catalog::{self, Catalog, LoadError, LoadReport};
use crate::config::{AppConfig, CatalogConfig};
use crate::error::AppError;

/// Current availability of the catalog.
#[derive(Debug, Clone)]
pub enum CatalogStatus {
    Ready(Arc<Catalog>),
    /// No catalog has been loaded successfully yet.
    Unavailable { reason: String },
}

/// Where the catalog documents live on disk.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    pub products_path: PathBuf,
    pub price_snapshots_path: PathBuf,
}

impl CatalogSource {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            products_path: config.products_path.clone(),
            price_snapshots_path: config.price_snapshots_path(),
        }
    }

    /// Run the loader on the blocking pool.
    pub async fn load(&self) -> Result<LoadReport, LoadError> {
        let source = self.clone();
        match tokio::task::spawn_blocking(move || {
            catalog::load_with_prices(&source.products_path, &source.price_snapshots_path)
        })
        .await
        {
            Ok(result) => result,
            Err(join_error) => Err(LoadError::MalformedDocument {
                path: self.products_path.clone(),
                reason: format!("loader task failed: {}", join_error),
            }),
        }
    }
}

/// Handle to the one shared catalog snapshot.
///
/// Readers clone the inner `Arc` and release the lock before querying, so a
/// reload replaces the snapshot in a single assignment and in-flight queries
/// keep the snapshot they started with.
#[derive(Clone)]
pub struct CatalogHandle {
    status: Arc<RwLock<CatalogStatus>>,
    source: CatalogSource,
}

impl CatalogHandle {
    pub fn ready(catalog: Catalog, source: CatalogSource) -> Self {
        Self::with_status(CatalogStatus::Ready(Arc::new(catalog)), source)
    }

    pub fn unavailable(reason: impl Into<String>, source: CatalogSource) -> Self {
        Self::with_status(
            CatalogStatus::Unavailable {
                reason: reason.into(),
            },
            source,
        )
    }

    /// Load the catalog for startup.
    ///
    /// With `require` set, a load failure is returned to the caller. Otherwise
    /// the handle starts out unavailable and waits for a successful reload.
    pub async fn open(source: CatalogSource, require: bool) -> Result<Self, LoadError> {
        match source.load().await {
            Ok(report) => {
                if !report.skipped.is_empty() {
                    tracing::warn!(
                        skipped = report.skipped.len(),
                        "Some product records were skipped"
                    );
                }
                Ok(Self::ready(report.catalog, source))
            }
            Err(e) if !require => {
                tracing::error!(error = %e, "Catalog unavailable, serving health status only");
                Ok(Self::unavailable(e.to_string(), source))
            }
            Err(e) => Err(e),
        }
    }

    fn with_status(status: CatalogStatus, source: CatalogSource) -> Self {
        Self {
            status: Arc::new(RwLock::new(status)),
            source,
        }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    pub async fn status(&self) -> CatalogStatus {
        self.status.read().await.clone()
    }

    /// The current snapshot, or `AppError::Unavailable`.
    pub async fn snapshot(&self) -> Result<Arc<Catalog>, AppError> {
        match &*self.status.read().await {
            CatalogStatus::Ready(catalog) => Ok(Arc::clone(catalog)),
            CatalogStatus::Unavailable { reason } => Err(AppError::Unavailable(reason.clone())),
        }
    }

    /// Replace the snapshot.
    pub async fn replace(&self, catalog: Catalog) {
        let catalog = Arc::new(catalog);
        *self.status.write().await = CatalogStatus::Ready(catalog);
    }

    /// Re-read the catalog documents and swap in the result.
    ///
    /// On failure the current state, ready or not, is left untouched.
    pub async fn reload(&self) -> Result<usize, LoadError> {
        let report = self.source.load().await?;
        let count = report.catalog.len();
        self.replace(report.catalog).await;
        tracing::info!(
            products = count,
            skipped = report.skipped.len(),
            "Catalog reloaded"
        );
        Ok(count)
    }
}

/// Shared application state, cloneable across handlers via Arc-wrapped fields.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: CatalogHandle,
}

impl AppState {
    pub fn new(config: AppConfig, catalog: CatalogHandle) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Limit, Product};
    use tempfile::TempDir;

    fn source_in(dir: &TempDir) -> CatalogSource {
        CatalogSource {
            products_path: dir.path().join("products.json"),
            price_snapshots_path: dir.path().join("price_snapshots.json"),
        }
    }

    fn write_products(dir: &TempDir, contents: &str) {
        std::fs::write(dir.path().join("products.json"), contents).unwrap();
    }

    #[tokio::test]
    async fn test_open_required_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = CatalogHandle::open(source_in(&dir), true).await;
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_open_optional_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let handle = CatalogHandle::open(source_in(&dir), false).await.unwrap();
        match handle.status().await {
            CatalogStatus::Unavailable { reason } => assert!(reason.contains("not found")),
            CatalogStatus::Ready(_) => panic!("catalog should be unavailable"),
        }
    }

    #[tokio::test]
    async fn test_open_loads_products() {
        let dir = TempDir::new().unwrap();
        write_products(&dir, r#"[{"name": "Milk 2L"}, {"name": "Bread"}, {"name": "Apples"}]"#);
        let handle = CatalogHandle::open(source_in(&dir), true).await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_snapshot_errors() {
        let dir = TempDir::new().unwrap();
        let handle = CatalogHandle::unavailable("missing", source_in(&dir));
        assert!(matches!(handle.snapshot().await, Err(AppError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_reload_from_unavailable() {
        let dir = TempDir::new().unwrap();
        let handle = CatalogHandle::unavailable("missing", source_in(&dir));

        assert!(handle.reload().await.is_err());
        assert!(matches!(handle.status().await, CatalogStatus::Unavailable { .. }));

        write_products(&dir, r#"[{"name": "Milk 2L"}]"#);
        assert_eq!(handle.reload().await.unwrap(), 1);
        assert!(matches!(handle.status().await, CatalogStatus::Ready(_)));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_snapshot() {
        let dir = TempDir::new().unwrap();
        let handle = CatalogHandle::ready(
            Catalog::new(vec![Product::named("Bread")]),
            source_in(&dir),
        );

        write_products(&dir, "{ broken");
        assert!(matches!(
            handle.reload().await,
            Err(LoadError::MalformedDocument { .. })
        ));

        let catalog = handle.snapshot().await.unwrap();
        assert_eq!(catalog.products()[0].name, "Bread");
    }

    #[tokio::test]
    async fn test_held_snapshot_survives_reload() {
        let dir = TempDir::new().unwrap();
        let handle = CatalogHandle::ready(
            Catalog::new(vec![Product::named("Old Milk"), Product::named("Old Bread")]),
            source_in(&dir),
        );

        let in_flight = handle.snapshot().await.unwrap();

        write_products(&dir, r#"[{"name": "New Milk"}]"#);
        handle.reload().await.unwrap();

        let limit = Limit::new(50, 500).unwrap();
        let old: Vec<_> = in_flight.list(limit).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(old, vec!["Old Milk", "Old Bread"]);

        let current = handle.snapshot().await.unwrap();
        let new: Vec<_> = current.list(limit).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(new, vec!["New Milk"]);
    }
}
