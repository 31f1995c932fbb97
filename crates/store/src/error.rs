//! Store error types.

use common::{OrderId, ProductId};
use domain::OrderStatus;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A reservation asked for more units than the product has.
    #[error("insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: u32,
    },

    /// A user with this email already exists.
    #[error("email already in use: {0}")]
    EmailInUse(String),

    /// A guarded order update found a different status at commit time.
    #[error("order {order_id} changed concurrently: expected {expected}, found {actual}")]
    StaleStatus {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },
}

impl StoreError {
    /// Builds a `NotFound` for the given entity kind and id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
