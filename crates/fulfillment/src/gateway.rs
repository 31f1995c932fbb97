//! Payment gateway capability.
//!
//! The external payment provider is modeled as an injected trait with a
//! single fallible call. [`FlakyGateway`] stands in for the real provider
//! (slow and randomly failing); [`InMemoryGateway`] is the deterministic
//! test double.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::{Money, OrderId};
use rand::Rng;
use thiserror::Error;

/// Failure reported by the payment provider for one charge attempt.
#[derive(Debug, Error)]
#[error("payment gateway failure: {0}")]
pub struct GatewayError(pub String);

/// Result of a successful charge.
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    /// Transaction identifier assigned by the provider.
    pub transaction_id: String,
}

/// Trait for the external payment collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the given amount for an order. May fail transiently.
    async fn charge(&self, order_id: OrderId, amount: Money) -> Result<ChargeReceipt, GatewayError>;
}

/// Simulation of an unreliable payment provider: non-trivial latency and a
/// configurable random failure rate.
#[derive(Debug, Clone)]
pub struct FlakyGateway {
    failure_rate: f64,
    latency: Duration,
}

impl FlakyGateway {
    /// Creates a gateway failing with the given probability per attempt.
    pub fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
        }
    }
}

impl Default for FlakyGateway {
    fn default() -> Self {
        Self::new(0.3, Duration::from_millis(100))
    }
}

#[async_trait]
impl PaymentGateway for FlakyGateway {
    async fn charge(&self, order_id: OrderId, amount: Money) -> Result<ChargeReceipt, GatewayError> {
        tokio::time::sleep(self.latency).await;

        let roll: f64 = rand::thread_rng().r#gen();
        if roll < self.failure_rate {
            return Err(GatewayError("payment provider timed out".to_string()));
        }

        tracing::debug!(%order_id, %amount, "charge accepted");
        Ok(ChargeReceipt {
            transaction_id: format!("txn-{}", uuid::Uuid::new_v4()),
        })
    }
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    charges: Vec<(OrderId, Money)>,
    calls: u32,
    next_id: u32,
    failures_remaining: u32,
    always_fail: bool,
}

/// Deterministic in-memory gateway for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a gateway that accepts every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` charge calls fail, then succeed again.
    pub fn fail_next(&self, n: u32) {
        self.state.write().unwrap().failures_remaining = n;
    }

    /// Makes every charge call fail until reset.
    pub fn set_always_fail(&self, fail: bool) {
        self.state.write().unwrap().always_fail = fail;
    }

    /// Total charge calls seen, including failed ones.
    pub fn call_count(&self) -> u32 {
        self.state.read().unwrap().calls
    }

    /// Number of successful charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn charge(&self, order_id: OrderId, amount: Money) -> Result<ChargeReceipt, GatewayError> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;

        if state.always_fail {
            return Err(GatewayError("gateway down".to_string()));
        }
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(GatewayError("transient gateway error".to_string()));
        }

        state.next_id += 1;
        state.charges.push((order_id, amount));
        Ok(ChargeReceipt {
            transaction_id: format!("PAY-{:04}", state.next_id),
        })
    }
}
