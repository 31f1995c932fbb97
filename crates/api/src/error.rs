//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::FulfillmentError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Fulfillment engine error.
    Fulfillment(FulfillmentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Fulfillment(err) => fulfillment_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn fulfillment_error_to_response(err: FulfillmentError) -> (StatusCode, String) {
    let status = match &err {
        FulfillmentError::UserNotFound(_)
        | FulfillmentError::ProductNotFound(_)
        | FulfillmentError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        FulfillmentError::InsufficientStock { .. }
        | FulfillmentError::InvalidState { .. }
        | FulfillmentError::Domain(_) => StatusCode::BAD_REQUEST,
        FulfillmentError::PaymentUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        FulfillmentError::Store(store_err) => match store_err {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::EmailInUse(_) => StatusCode::BAD_REQUEST,
            StoreError::StaleStatus { .. } => StatusCode::CONFLICT,
            StoreError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
        },
    };
    (status, err.to_string())
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Fulfillment(err.into())
    }
}
