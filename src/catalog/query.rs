//! Immutable catalog snapshot and its read operations.

use chrono::{DateTime, Utc};

use super::Product;

/// Invalid query input from a client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("limit must be a positive integer, got {0:?}")]
    InvalidLimit(String),

    #[error("limit must be at most {max}, got {value}")]
    LimitTooLarge { value: u64, max: usize },

    #[error("invalid query parameters: {0}")]
    InvalidParameters(String),
}

/// A validated, positive bound on the number of returned products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(usize);

impl Limit {
    /// Parse a raw `limit` parameter.
    ///
    /// Absent means `default`. Non-integers, zero and negatives are rejected,
    /// as are values above `max`; nothing is clamped.
    pub fn parse(raw: Option<&str>, default: usize, max: usize) -> Result<Self, QueryError> {
        let Some(raw) = raw else {
            return Self::new(default as u64, max);
        };

        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| QueryError::InvalidLimit(raw.to_string()))?;
        if value <= 0 {
            return Err(QueryError::InvalidLimit(raw.to_string()));
        }
        Self::new(value as u64, max)
    }

    /// Build a limit from a known value, checking it against `max`.
    pub fn new(value: u64, max: usize) -> Result<Self, QueryError> {
        if value == 0 {
            return Err(QueryError::InvalidLimit(value.to_string()));
        }
        if value > max as u64 {
            return Err(QueryError::LimitTooLarge { value, max });
        }
        Ok(Self(value as usize))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// An ordered, read-only product snapshot.
///
/// Lowercased names are computed once here so searches only compare strings.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    folded_names: Vec<String>,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        let folded_names = products.iter().map(|p| p.name.to_lowercase()).collect();
        Self {
            products,
            folded_names,
            loaded_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub(crate) fn into_products(self) -> Vec<Product> {
        self.products
    }

    /// The first `limit` products in snapshot order.
    pub fn list(&self, limit: Limit) -> &[Product] {
        let end = limit.get().min(self.products.len());
        &self.products[..end]
    }

    /// Products whose name contains `query`, case-insensitively, in snapshot
    /// order, truncated to `limit`.
    pub fn search(&self, query: &str, limit: Limit) -> Result<Vec<&Product>, QueryError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        Ok(self
            .products
            .iter()
            .zip(&self.folded_names)
            .filter(|(_, name)| name.contains(&needle))
            .map(|(product, _)| product)
            .take(limit.get())
            .collect())
    }
}
