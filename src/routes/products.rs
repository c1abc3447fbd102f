//! Product listing and search handlers.
//!
//! Query parameters are taken as raw strings so a bad `limit` is reported
//! through [`AppError`] with the catalog's own message. A query string that
//! does not deserialize at all (e.g. a repeated `limit`) is also mapped to
//! [`AppError`] rather than axum's plain-text rejection.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::{Limit, Product, QueryError};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

fn rejected_params(rejection: QueryRejection) -> AppError {
    QueryError::InvalidParameters(rejection.body_text()).into()
}

/// `GET /products`
#[instrument(name = "products::list", skip(state))]
pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(params) = params.map_err(rejected_params)?;
    let limits = &state.config.catalog.limits;
    let limit = Limit::parse(params.limit.as_deref(), limits.list_default, limits.list_max)?;

    let catalog = state.catalog.snapshot().await?;
    let products = catalog.list(limit).to_vec();
    tracing::debug!(limit = limit.get(), returned = products.len(), "Listed products");
    Ok(Json(products))
}

/// `GET /products/search`
#[instrument(name = "products::search", skip(state))]
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(params) = params.map_err(rejected_params)?;
    let limits = &state.config.catalog.limits;
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(QueryError::EmptyQuery.into());
    }
    let limit = Limit::parse(
        params.limit.as_deref(),
        limits.search_default,
        limits.search_max,
    )?;

    let catalog = state.catalog.snapshot().await?;
    let products: Vec<Product> = catalog.search(&query, limit)?.into_iter().cloned().collect();
    tracing::debug!(
        query = %query,
        limit = limit.get(),
        returned = products.len(),
        "Searched products"
    );
    Ok(Json(products))
}
