//! Caller-visible fulfillment errors.

use common::{OrderId, ProductId, UserId};
use domain::{DomainError, OrderStatus};
use store::StoreError;
use thiserror::Error;

/// The error taxonomy surfaced to callers of the fulfillment engine.
///
/// None of these are retried internally except the gateway failures folded
/// into `PaymentUnavailable`; everything else surfaces immediately with no
/// partial state left behind.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Unknown user id.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// Unknown product id.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Unknown order id.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// A line asked for more units than the product has.
    #[error("insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    /// The order is not in a status that allows the requested transition.
    #[error("order is {status}, cannot {action}")]
    InvalidState {
        status: OrderStatus,
        action: &'static str,
    },

    /// The payment gateway failed on every attempt. The order stays pending
    /// and the whole `pay` call may be retried by the client.
    #[error("payment unavailable after {attempts} attempts")]
    PaymentUnavailable { attempts: u32 },

    /// Input validation or entity rule failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Any other persistence failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for FulfillmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientStock {
                name,
                requested,
                available,
                ..
            } => FulfillmentError::InsufficientStock {
                product: name,
                requested,
                available,
            },
            other => FulfillmentError::Store(other),
        }
    }
}

/// Result type for fulfillment operations.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
