//! Domain error types.

use common::ProductId;
use thiserror::Error;

/// Errors raised by entity construction and state rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// An order must contain at least one line.
    #[error("order must contain at least one line item")]
    EmptyOrder,

    /// Line quantities must be positive.
    #[error("quantity for product {product_id} must be positive")]
    InvalidQuantity { product_id: ProductId },

    /// The email address failed basic shape validation.
    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    /// Catch-all for other input validation failures.
    #[error("validation failed: {0}")]
    Validation(String),
}
