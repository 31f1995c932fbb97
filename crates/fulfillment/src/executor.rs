//! Payment retry executor.

use common::OrderId;
use domain::{Order, OrderStatus};
use store::{Store, StoreError};

use crate::backoff::RetryPolicy;
use crate::error::{FulfillmentError, Result};
use crate::gateway::PaymentGateway;

/// Result of a successful payment.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub transaction_id: String,
    pub order: Order,
}

/// Drives charges against the payment gateway with bounded retries.
pub struct PaymentExecutor<S: Store, G: PaymentGateway> {
    store: S,
    gateway: G,
    policy: RetryPolicy,
}

impl<S: Store, G: PaymentGateway> PaymentExecutor<S, G> {
    /// Creates an executor over a store and gateway.
    pub fn new(store: S, gateway: G, policy: RetryPolicy) -> Self {
        Self {
            store,
            gateway,
            policy,
        }
    }

    /// Returns the retry policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Charges a pending order.
    ///
    /// Non-pending orders are rejected before any gateway call. Transient
    /// gateway failures are retried up to the policy's attempt cap with
    /// exponential backoff and jitter between attempts; exhausting the cap
    /// returns `PaymentUnavailable` and leaves the order pending so the
    /// client may retry the whole call. On success the order moves
    /// `Pending -> Confirmed` via compare-and-set, so a cancellation that
    /// won the race surfaces as `InvalidState` rather than a double outcome.
    #[tracing::instrument(skip(self))]
    pub async fn pay(&self, order_id: OrderId) -> Result<PaymentOutcome> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;

        if !order.status.can_pay() {
            return Err(FulfillmentError::InvalidState {
                status: order.status,
                action: "pay",
            });
        }

        for attempt in 1..=self.policy.max_attempts {
            metrics::counter!("payment_attempts_total").increment(1);

            match self.gateway.charge(order_id, order.total).await {
                Ok(receipt) => {
                    let confirmed = self
                        .store
                        .transition_order(
                            order_id,
                            OrderStatus::Pending,
                            OrderStatus::Confirmed,
                            Some(receipt.transaction_id.clone()),
                        )
                        .await
                        .map_err(|e| match e {
                            StoreError::StaleStatus { actual, .. } => {
                                FulfillmentError::InvalidState {
                                    status: actual,
                                    action: "pay",
                                }
                            }
                            StoreError::NotFound { .. } => {
                                FulfillmentError::OrderNotFound(order_id)
                            }
                            other => other.into(),
                        })?;

                    metrics::counter!("payments_confirmed_total").increment(1);
                    tracing::info!(%order_id, attempt, "payment confirmed");
                    return Ok(PaymentOutcome {
                        transaction_id: receipt.transaction_id,
                        order: confirmed,
                    });
                }
                Err(e) => {
                    tracing::warn!(%order_id, attempt, error = %e, "payment attempt failed");
                    if attempt < self.policy.max_attempts {
                        metrics::counter!("payment_retries_total").increment(1);
                        tokio::time::sleep(self.policy.jittered_delay(attempt)).await;
                    }
                }
            }
        }

        metrics::counter!("payments_unavailable_total").increment(1);
        Err(FulfillmentError::PaymentUnavailable {
            attempts: self.policy.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::orders::{OrderLine, OrderService};
    use common::{Money, UserId};
    use domain::{Product, User};
    use std::time::Duration;
    use store::MemoryStore;

    async fn setup(
        policy: RetryPolicy,
    ) -> (
        PaymentExecutor<MemoryStore, InMemoryGateway>,
        OrderService<MemoryStore>,
        InMemoryGateway,
        MemoryStore,
        UserId,
    ) {
        let store = MemoryStore::new();
        let gateway = InMemoryGateway::new();
        let user = User::new("ada@example.com", "Ada").unwrap();
        let user_id = user.id;
        store.insert_user(user).await.unwrap();

        (
            PaymentExecutor::new(store.clone(), gateway.clone(), policy),
            OrderService::new(store.clone()),
            gateway,
            store,
            user_id,
        )
    }

    async fn pending_order(
        service: &OrderService<MemoryStore>,
        store: &MemoryStore,
        user_id: UserId,
    ) -> OrderId {
        let product = Product::new("Widget", "", Money::from_cents(1000), 10, None);
        let product_id = product.id;
        store.insert_product(product).await.unwrap();
        let order = service
            .create_order(
                user_id,
                vec![OrderLine {
                    product_id,
                    quantity: 2,
                }],
            )
            .await
            .unwrap();
        order.id
    }

    #[tokio::test]
    async fn pay_confirms_on_first_success() {
        let (executor, service, gateway, store, user_id) = setup(RetryPolicy::default()).await;
        let order_id = pending_order(&service, &store, user_id).await;

        let outcome = executor.pay(order_id).await.unwrap();
        assert_eq!(outcome.transaction_id, "PAY-0001");
        assert_eq!(outcome.order.status, OrderStatus::Confirmed);
        assert_eq!(gateway.call_count(), 1);

        let stored = store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Confirmed);
        assert_eq!(stored.payment_ref.as_deref(), Some("PAY-0001"));
    }

    #[tokio::test(start_paused = true)]
    async fn pay_retries_transient_failures_with_backoff() {
        let policy = RetryPolicy::new(5, Duration::from_millis(200));
        let (executor, service, gateway, store, user_id) = setup(policy.clone()).await;
        let order_id = pending_order(&service, &store, user_id).await;
        gateway.fail_next(2);

        let start = tokio::time::Instant::now();
        let outcome = executor.pay(order_id).await.unwrap();
        let waited = start.elapsed();

        assert_eq!(gateway.call_count(), 3);
        assert_eq!(outcome.order.status, OrderStatus::Confirmed);

        // Two inter-attempt waits: [200, 400) + [400, 800) ms.
        assert!(waited >= Duration::from_millis(600), "waited {waited:?}");
        assert!(waited < Duration::from_millis(1200), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn pay_exhausts_attempts_and_leaves_order_pending() {
        let policy = RetryPolicy::new(5, Duration::from_millis(200));
        let (executor, service, gateway, store, user_id) = setup(policy).await;
        let order_id = pending_order(&service, &store, user_id).await;
        gateway.set_always_fail(true);

        let err = executor.pay(order_id).await.unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::PaymentUnavailable { attempts: 5 }
        ));
        assert_eq!(gateway.call_count(), 5);

        let stored = store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);

        // The client may retry the whole call later.
        gateway.set_always_fail(false);
        let outcome = executor.pay(order_id).await.unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn pay_rejects_non_pending_without_calling_gateway() {
        let (executor, service, gateway, store, user_id) = setup(RetryPolicy::default()).await;

        let confirmed = pending_order(&service, &store, user_id).await;
        executor.pay(confirmed).await.unwrap();
        let calls_after_first = gateway.call_count();

        let err = executor.pay(confirmed).await.unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::InvalidState {
                status: OrderStatus::Confirmed,
                ..
            }
        ));

        let cancelled = pending_order(&service, &store, user_id).await;
        service.cancel_order(cancelled).await.unwrap();
        let err = executor.pay(cancelled).await.unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::InvalidState {
                status: OrderStatus::Cancelled,
                ..
            }
        ));

        // Neither rejection reached the gateway.
        assert_eq!(gateway.call_count(), calls_after_first);
    }

    #[tokio::test]
    async fn pay_unknown_order_is_not_found() {
        let (executor, _, gateway, _, _) = setup(RetryPolicy::default()).await;
        let err = executor.pay(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, FulfillmentError::OrderNotFound(_)));
        assert_eq!(gateway.call_count(), 0);
    }

    /// Gateway that signals when a charge is in flight and waits for the
    /// test to let it finish, so a cancellation can be interleaved.
    #[derive(Clone)]
    struct GatedGateway {
        entered: std::sync::Arc<tokio::sync::Semaphore>,
        release: std::sync::Arc<tokio::sync::Semaphore>,
    }

    impl GatedGateway {
        fn new() -> Self {
            Self {
                entered: std::sync::Arc::new(tokio::sync::Semaphore::new(0)),
                release: std::sync::Arc::new(tokio::sync::Semaphore::new(0)),
            }
        }
    }

    #[async_trait::async_trait]
    impl PaymentGateway for GatedGateway {
        async fn charge(
            &self,
            _order_id: OrderId,
            _amount: Money,
        ) -> std::result::Result<crate::gateway::ChargeReceipt, crate::gateway::GatewayError>
        {
            self.entered.add_permits(1);
            self.release.acquire().await.unwrap().forget();
            Ok(crate::gateway::ChargeReceipt {
                transaction_id: "PAY-RACE".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn cancel_during_charge_beats_the_confirmation() {
        let store = MemoryStore::new();
        let gateway = GatedGateway::new();
        let user = User::new("ada@example.com", "Ada").unwrap();
        let user_id = user.id;
        store.insert_user(user).await.unwrap();
        let service = OrderService::new(store.clone());
        let order_id = pending_order(&service, &store, user_id).await;

        let executor = PaymentExecutor::new(
            store.clone(),
            gateway.clone(),
            RetryPolicy::new(1, Duration::ZERO),
        );
        let pay = tokio::spawn(async move { executor.pay(order_id).await });

        // Wait until pay has passed its precondition and is mid-charge.
        gateway.entered.acquire().await.unwrap().forget();
        service.cancel_order(order_id).await.unwrap();
        gateway.release.add_permits(1);

        // The charge succeeded at the gateway, but the compare-and-set must
        // refuse to confirm a cancelled order.
        let err = pay.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            FulfillmentError::InvalidState {
                status: OrderStatus::Cancelled,
                ..
            }
        ));
        let stored = store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Cancelled);
        assert!(stored.payment_ref.is_none());
        // Stock was restored by the cancellation.
        assert_eq!(store.order_count().await, 1);
    }
}
