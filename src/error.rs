//! HTTP-facing error type.
//!
//! Every failure a handler can return maps to a status code and a JSON body
//! of the form `{"error": {"code": "...", "message": "..."}}`.

use axum::{
    http::{header::CACHE_CONTROL, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::catalog::QueryError;
use crate::config::CACHE_CONTROL_NO_STORE;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    BadRequest(#[from] QueryError),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Not found")]
    NotFound,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::Unavailable(_) => "catalog_unavailable",
            AppError::NotFound => "not_found",
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`)
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Unavailable(reason) => {
                tracing::warn!(reason = %reason, "Request rejected, catalog unavailable")
            }
            _ => tracing::debug!(status = status.as_u16(), error = %self, "Client error"),
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        };
        (status, [(CACHE_CONTROL, CACHE_CONTROL_NO_STORE)], Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_errors_are_bad_requests() {
        let err = AppError::from(QueryError::EmptyQuery);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "bad_request");
        assert_eq!(err.to_string(), "query must not be empty");
    }

    #[test]
    fn test_unavailable_is_503() {
        let err = AppError::Unavailable("Products file not found".to_string());
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_responses_not_cached() {
        let response = AppError::from(QueryError::EmptyQuery).into_response();
        assert_eq!(response.headers()[CACHE_CONTROL], CACHE_CONTROL_NO_STORE);
    }

    #[test]
    fn test_not_found_response() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }
}
