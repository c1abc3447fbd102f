//! Price snapshots recorded by the scraper.
//!
//! The snapshots document is a JSON array of timestamped price observations
//! keyed by product key. Only the most recent observation per key is kept.
//! The document is optional and never fails a catalog load.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use super::loader::{read_document, LoadError};

/// A single price observation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceSnapshot {
    pub product_key: String,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub unit_price: Option<Value>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub scraped_at: Option<String>,
}

impl PriceSnapshot {
    /// Null, empty-string and `false` values carry no price information.
    /// Keys are trimmed the same way the loader trims product keys.
    fn normalize(mut self) -> Self {
        self.product_key = self.product_key.trim().to_string();
        self.price = self.price.filter(is_present);
        self.unit_price = self.unit_price.filter(is_present);
        self.source_url = self.source_url.filter(|s| !s.is_empty());
        self.scraped_at = self.scraped_at.filter(|s| !s.is_empty());
        self
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Order two `scraped_at` values. RFC 3339 timestamps are compared as
/// instants; anything else falls back to plain string order.
fn compare_scraped_at(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or_default();
    let b = b.unwrap_or_default();
    match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Reduce raw snapshot records to the latest snapshot per product key.
///
/// Entries that are not objects or have no usable `product_key` are ignored.
/// Equal timestamps resolve to the later entry in the document.
pub(crate) fn latest_by_key(records: Vec<Value>) -> HashMap<String, PriceSnapshot> {
    let mut latest: HashMap<String, PriceSnapshot> = HashMap::new();

    for record in records {
        let snapshot = match serde_json::from_value::<PriceSnapshot>(record) {
            Ok(snapshot) => snapshot.normalize(),
            Err(_) => continue,
        };
        if snapshot.product_key.is_empty() {
            continue;
        }

        let newer = match latest.get(&snapshot.product_key) {
            Some(current) => {
                compare_scraped_at(
                    snapshot.scraped_at.as_deref(),
                    current.scraped_at.as_deref(),
                ) != Ordering::Less
            }
            None => true,
        };
        if newer {
            latest.insert(snapshot.product_key.clone(), snapshot);
        }
    }

    latest
}

/// Read the snapshots document at `path`.
///
/// A missing or unusable file yields an empty map; the reason is logged.
pub(crate) fn load_latest(path: &Path) -> HashMap<String, PriceSnapshot> {
    match read_document(path) {
        Ok(records) => {
            let latest = latest_by_key(records);
            tracing::debug!(path = %path.display(), keys = latest.len(), "Loaded price snapshots");
            latest
        }
        Err(LoadError::NotFound { .. }) => {
            tracing::debug!(path = %path.display(), "No price snapshots file, serving without prices");
            HashMap::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unusable price snapshots file");
            HashMap::new()
        }
    }
}
