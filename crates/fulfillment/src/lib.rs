//! Order fulfillment: the transaction builder that turns a cart into a
//! durable order, and the retry executor that drives the external payment
//! gateway.

pub mod backoff;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod orders;

pub use backoff::RetryPolicy;
pub use error::{FulfillmentError, Result};
pub use executor::{PaymentExecutor, PaymentOutcome};
pub use gateway::{ChargeReceipt, FlakyGateway, GatewayError, InMemoryGateway, PaymentGateway};
pub use orders::{OrderLine, OrderService};
