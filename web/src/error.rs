//! Error bridge from the domain taxonomy to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use stagepass_core::Error;
use std::fmt;

/// Application error type for web handlers.
///
/// Wraps domain errors with an HTTP status and a stable machine-readable
/// code, and implements Axum's `IntoResponse`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    /// Internal error for logging, never exposed to the client.
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create an error from its parts.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self { status, message, code, source: None }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message.into(), "BAD_REQUEST")
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into(), "UNAUTHORIZED")
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.into(), "NOT_FOUND")
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "request failed"
                );
            }
        }
        let body = ErrorResponse { code: self.code, message: self.message };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Validation { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), "VALIDATION_ERROR")
            }
            Error::InsufficientInventory { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                err.to_string(),
                "INSUFFICIENT_INVENTORY",
            ),
            Error::InsufficientBalance { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                err.to_string(),
                "INSUFFICIENT_BALANCE",
            ),
            Error::OrderNotPaid { .. } => {
                Self::new(StatusCode::CONFLICT, err.to_string(), "ORDER_NOT_PAID")
            }
            Error::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, err.to_string(), "NOT_FOUND")
            }
            Error::Authentication { .. } => Self::new(
                StatusCode::UNAUTHORIZED,
                err.to_string(),
                "AUTHENTICATION_FAILED",
            ),
            Error::UpstreamGateway { .. } => Self::new(
                StatusCode::BAD_GATEWAY,
                err.to_string(),
                "UPSTREAM_GATEWAY",
            ),
            // Store details stay in the log, not in the response body.
            Error::Storage { .. } => Self::internal("storage failure").with_source(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagepass_core::types::{Money, OrderId};

    #[test]
    fn validation_maps_to_400() {
        let app: AppError = Error::validation("quantity must be at least 1").into();
        assert_eq!(app.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.code, "VALIDATION_ERROR");
    }

    #[test]
    fn balance_rejection_maps_to_400() {
        let app: AppError = Error::InsufficientBalance {
            requested: Money::from_minor(700_000),
            available: Money::from_minor(500_000),
        }
        .into();
        assert_eq!(app.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.code, "INSUFFICIENT_BALANCE");
    }

    #[test]
    fn authentication_maps_to_401() {
        let app: AppError = Error::authentication("signature mismatch").into();
        assert_eq!(app.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let app: AppError = Error::storage("connection refused to 10.0.0.3").into();
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!app.message.contains("10.0.0.3"));
    }

    #[test]
    fn not_paid_maps_to_409() {
        let app: AppError = Error::OrderNotPaid { order_id: OrderId::new() }.into();
        assert_eq!(app.status(), StatusCode::CONFLICT);
    }
}
