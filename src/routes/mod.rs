//! HTTP route handlers for the catalog API.
//!
//! Product responses carry a short Cache-Control lifetime since a reload can
//! change them at any time. Health responses are never cached.
//!
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod health;
pub mod products;

use axum::{
    http::Method,
    middleware,
    routing::get,
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::{CACHE_CONTROL_NO_STORE, CACHE_CONTROL_PRODUCTS};
use crate::error::AppError;
use crate::middleware::request_id_layer;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Creates the Axum router with all routes, CORS and cache headers.
pub fn create_router(state: AppState) -> Router {
    // Product list and search - short cache, reload may change them
    let product_routes = Router::new()
        .route("/products", get(products::list))
        .route("/products/search", get(products::search))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_PRODUCTS),
        ));

    // Health check - no caching, always fresh for liveness probes
    let health_routes = Router::new().route("/health", get(health::health)).layer(
        SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_NO_STORE),
        ),
    );

    // Browser clients call the API cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .merge(product_routes)
        .merge(health_routes)
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
