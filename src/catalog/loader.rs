//! Catalog loading from the scraper's JSON documents.
//!
//! The products document must be a JSON array of objects. Records that do not
//! have the minimal product shape are skipped and reported; they never fail
//! the load. Only an unreadable or structurally invalid document does.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{derive_product_key, prices, Catalog, Product};

/// Fatal load failures. The service cannot serve without a catalog.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Products file not found at {}: {source}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Products file {} is malformed: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },
}

/// Why a single record was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordShapeError {
    #[error("record is not an object")]
    NotAnObject,

    #[error("record has no name")]
    MissingName,

    #[error("record name is blank")]
    BlankName,

    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}

/// A record that was skipped during loading, with its position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub error: RecordShapeError,
}

/// Result of a successful load.
#[derive(Debug)]
pub struct LoadReport {
    pub catalog: Catalog,
    pub skipped: Vec<SkippedRecord>,
}

/// Known product fields as the scraper writes them.
#[derive(Debug, Deserialize)]
struct ProductRecord {
    name: String,
    #[serde(default)]
    packaging_format: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    product_key: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Fields that are filled from price snapshots and must not be shadowed by
/// stray values in the products document.
const PRICE_FIELDS: [&str; 4] = ["price", "unit_price", "source_url", "scraped_at"];

/// Known fields that must hold text when present.
const TEXT_FIELDS: [&str; 4] = ["name", "packaging_format", "image", "product_key"];

/// Read a file and parse it as a top-level JSON array.
pub(crate) fn read_document(path: &Path) -> Result<Vec<Value>, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::InvalidData {
            LoadError::MalformedDocument {
                path: path.to_path_buf(),
                reason: "not valid UTF-8".to_string(),
            }
        } else {
            LoadError::NotFound {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let value: Value =
        serde_json::from_str(&contents).map_err(|e| LoadError::MalformedDocument {
            path: path.to_path_buf(),
            reason: format!("invalid JSON: {}", e),
        })?;

    match value {
        Value::Array(records) => Ok(records),
        _ => Err(LoadError::MalformedDocument {
            path: path.to_path_buf(),
            reason: "top level must be a JSON array".to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Turn one raw record into a product, or explain why it cannot be one.
fn parse_record(record: Value) -> Result<Product, RecordShapeError> {
    let object = match record {
        Value::Object(object) => object,
        _ => return Err(RecordShapeError::NotAnObject),
    };

    match object.get("name") {
        None | Some(Value::Null) => return Err(RecordShapeError::MissingName),
        Some(Value::String(name)) if name.trim().is_empty() => {
            return Err(RecordShapeError::BlankName)
        }
        _ => {}
    }

    for field in TEXT_FIELDS {
        match object.get(field) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(other) => {
                return Err(RecordShapeError::InvalidField {
                    field: field.to_string(),
                    reason: format!("expected text, found {}", json_kind(other)),
                })
            }
        }
    }

    let record: ProductRecord = serde_json::from_value(Value::Object(object)).map_err(|e| {
        RecordShapeError::InvalidField {
            field: "record".to_string(),
            reason: e.to_string(),
        }
    })?;

    let packaging_format = non_empty(record.packaging_format);
    let product_key = non_empty(record.product_key.map(|k| k.trim().to_string()))
        .unwrap_or_else(|| derive_product_key(&record.name, packaging_format.as_deref()));

    let mut extra = record.extra;
    for field in PRICE_FIELDS {
        extra.remove(field);
    }

    Ok(Product {
        product_key,
        name: record.name,
        packaging_format,
        image: non_empty(record.image),
        price: None,
        unit_price: None,
        source_url: None,
        scraped_at: None,
        extra,
    })
}

/// Load a catalog snapshot from the products document at `path`.
///
/// Products appear in the snapshot in document order. Malformed records are
/// skipped and listed in the report.
pub fn load(path: impl AsRef<Path>) -> Result<LoadReport, LoadError> {
    let path = path.as_ref();
    let records = read_document(path)?;
    let total = records.len();

    let mut products = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        match parse_record(record) {
            Ok(product) => products.push(product),
            Err(error) => {
                tracing::warn!(index, error = %error, "Skipping malformed product record");
                skipped.push(SkippedRecord { index, error });
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        records = total,
        products = products.len(),
        skipped = skipped.len(),
        "Loaded products"
    );

    Ok(LoadReport {
        catalog: Catalog::new(products),
        skipped,
    })
}

/// Load the products document and merge in the latest price per product key
/// from the snapshots document at `prices_path`.
///
/// The snapshots document is optional; problems with it are logged and the
/// catalog is served without prices.
pub fn load_with_prices(
    products_path: impl AsRef<Path>,
    prices_path: impl AsRef<Path>,
) -> Result<LoadReport, LoadError> {
    let report = load(products_path)?;
    let latest = prices::load_latest(prices_path.as_ref());
    if latest.is_empty() {
        return Ok(report);
    }

    let mut products = report.catalog.into_products();
    let mut priced = 0usize;
    for product in &mut products {
        if let Some(snapshot) = latest.get(&product.product_key) {
            product.apply_price(snapshot);
            priced += 1;
        }
    }
    tracing::debug!(priced, total = products.len(), "Merged price snapshots");

    Ok(LoadReport {
        catalog: Catalog::new(products),
        skipped: report.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn names(report: &LoadReport) -> Vec<&str> {
        report.catalog.products().iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "products.json",
            r#"[{"name": "Milk 2L"}, {"name": "Bread"}, {"name": "Apples"}]"#,
        );
        let report = load(&path).unwrap();
        assert_eq!(names(&report), vec!["Milk 2L", "Bread", "Apples"]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_load_skips_record_without_name() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "products.json",
            r#"[{"name": "Milk 2L"}, {"image": "x.png"}, {"name": "Apples"}]"#,
        );
        let report = load(&path).unwrap();
        assert_eq!(names(&report), vec!["Milk 2L", "Apples"]);
        assert_eq!(
            report.skipped,
            vec![SkippedRecord {
                index: 1,
                error: RecordShapeError::MissingName
            }]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load(dir.path().join("products.json")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "products.json", "[{\"name\": ");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, LoadError::MalformedDocument { .. }));
    }

    #[test]
    fn test_load_top_level_not_array() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "products.json", r#"{"products": []}"#);
        let err = load(&path).unwrap_err();
        match err {
            LoadError::MalformedDocument { reason, .. } => assert!(reason.contains("array")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "products.json", "[]");
        let report = load(&path).unwrap();
        assert!(report.catalog.is_empty());
    }

    #[test]
    fn test_parse_record_rejects_shapes() {
        assert_eq!(parse_record(json!(3)), Err(RecordShapeError::NotAnObject));
        assert_eq!(parse_record(json!({"name": null})), Err(RecordShapeError::MissingName));
        assert_eq!(parse_record(json!({"name": "   "})), Err(RecordShapeError::BlankName));

        match parse_record(json!({"name": 12})) {
            Err(RecordShapeError::InvalidField { field, .. }) => assert_eq!(field, "name"),
            other => panic!("unexpected result: {other:?}"),
        }
        match parse_record(json!({"name": "Tea", "image": ["a", "b"]})) {
            Err(RecordShapeError::InvalidField { field, reason }) => {
                assert_eq!(field, "image");
                assert!(reason.contains("an array"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_record_fields() {
        let product = parse_record(json!({
            "name": "Oat Milk",
            "packaging_format": "1L",
            "image": "",
            "store": "north",
            "price": "stale",
        }))
        .unwrap();
        assert_eq!(product.product_key, "oat milk__1l");
        assert_eq!(product.packaging_format.as_deref(), Some("1L"));
        assert_eq!(product.image, None);
        assert_eq!(product.extra.get("store"), Some(&json!("north")));
        assert!(!product.extra.contains_key("price"));
        assert_eq!(product.price, None);
    }

    #[test]
    fn test_parse_record_keeps_given_key() {
        let product = parse_record(json!({"name": "Tea", "product_key": "sku-991"})).unwrap();
        assert_eq!(product.product_key, "sku-991");

        let product = parse_record(json!({"name": "Tea", "product_key": ""})).unwrap();
        assert_eq!(product.product_key, "tea__");
    }

    #[test]
    fn test_load_with_prices_merges_latest() {
        let dir = TempDir::new().unwrap();
        let products = write(
            &dir,
            "products.json",
            r#"[
                {"name": "Milk 2L", "packaging_format": "Carton"},
                {"name": "Bread"}
            ]"#,
        );
        let prices = write(
            &dir,
            "price_snapshots.json",
            r#"[
                {"product_key": "milk 2l__carton", "price": "2.10", "scraped_at": "2024-05-01T08:00:00Z"},
                {"product_key": "milk 2l__carton", "price": "2.30", "unit_price": "1.15/L",
                 "source_url": "https://shop.example/milk", "scraped_at": "2024-05-02T08:00:00Z"}
            ]"#,
        );

        let report = load_with_prices(&products, &prices).unwrap();
        let milk = &report.catalog.products()[0];
        assert_eq!(milk.price, Some(json!("2.30")));
        assert_eq!(milk.unit_price, Some(json!("1.15/L")));
        assert_eq!(milk.source_url.as_deref(), Some("https://shop.example/milk"));
        assert_eq!(milk.scraped_at.as_deref(), Some("2024-05-02T08:00:00Z"));

        let bread = &report.catalog.products()[1];
        assert_eq!(bread.price, None);
    }

    #[test]
    fn test_load_with_prices_joins_padded_keys() {
        let dir = TempDir::new().unwrap();
        let products = write(
            &dir,
            "products.json",
            r#"[{"name": "Bread", "product_key": " bread-01 "}]"#,
        );
        let prices = write(
            &dir,
            "price_snapshots.json",
            r#"[{"product_key": "bread-01  ", "price": 1.99}]"#,
        );

        let report = load_with_prices(&products, &prices).unwrap();
        let bread = &report.catalog.products()[0];
        assert_eq!(bread.product_key, "bread-01");
        assert_eq!(bread.price, Some(json!(1.99)));
    }

    #[test]
    fn test_load_with_prices_tolerates_broken_prices() {
        let dir = TempDir::new().unwrap();
        let products = write(&dir, "products.json", r#"[{"name": "Bread"}]"#);
        let prices = write(&dir, "price_snapshots.json", "not json");
        let report = load_with_prices(&products, &prices).unwrap();
        assert_eq!(report.catalog.len(), 1);
    }

    #[test]
    fn test_load_with_prices_requires_products() {
        let dir = TempDir::new().unwrap();
        let prices = write(&dir, "price_snapshots.json", "[]");
        let err = load_with_prices(dir.path().join("products.json"), &prices).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }
}
