//! Shared value types used across the fulfillment engine.

pub mod ids;
pub mod money;

pub use ids::{CategoryId, OrderId, ProductId, UserId};
pub use money::Money;
