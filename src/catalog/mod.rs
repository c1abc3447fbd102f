//! Product catalog: in-memory snapshot, loading and queries.
//!
//! The catalog is harvested by an external scraper into a JSON document and
//! loaded once per process (or per reload) into an immutable [`Catalog`].
//! Queries never touch the filesystem.
//!
//! Key re-exports:
//! - [`Catalog`] - Immutable ordered snapshot answering list and search queries
//! - [`load`] / [`load_with_prices`] - Build a snapshot from documents on disk
//! - [`Limit`] - Validated result bound for queries

mod loader;
mod prices;
mod query;

pub use loader::{load, load_with_prices, LoadError, LoadReport, RecordShapeError, SkippedRecord};
pub use prices::PriceSnapshot;
pub use query::{Catalog, Limit, QueryError};

use serde::Serialize;
use serde_json::{Map, Value};

/// A single catalog entry.
///
/// Fields the service knows about are named; anything else the scraper wrote
/// is kept in `extra` and serialized back alongside them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub product_key: String,
    pub name: String,
    pub packaging_format: Option<String>,
    pub image: Option<String>,
    /// Latest observed price, as written by the scraper (number or text)
    pub price: Option<Value>,
    pub unit_price: Option<Value>,
    pub source_url: Option<String>,
    pub scraped_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Create a product with only a name; the key is derived from it.
    #[cfg(test)]
    pub(crate) fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            product_key: derive_product_key(&name, None),
            name,
            packaging_format: None,
            image: None,
            price: None,
            unit_price: None,
            source_url: None,
            scraped_at: None,
            extra: Map::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_packaging(mut self, packaging_format: impl Into<String>) -> Self {
        let packaging_format = packaging_format.into();
        self.product_key = derive_product_key(&self.name, Some(&packaging_format));
        self.packaging_format = Some(packaging_format);
        self
    }

    /// Copy the price fields of a snapshot onto this product.
    pub(crate) fn apply_price(&mut self, snapshot: &PriceSnapshot) {
        self.price = snapshot.price.clone();
        self.unit_price = snapshot.unit_price.clone();
        self.source_url = snapshot.source_url.clone();
        self.scraped_at = snapshot.scraped_at.clone();
    }
}

/// Build the key the scraper uses to join products with price snapshots:
/// `trim(name)__trim(packaging)`, lowercased.
pub fn derive_product_key(name: &str, packaging_format: Option<&str>) -> String {
    format!(
        "{}__{}",
        name.trim(),
        packaging_format.unwrap_or_default().trim()
    )
    .to_lowercase()
}
