//! Order creation and cancellation.

use common::{OrderId, UserId};
use domain::{DomainError, Order, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};
use store::{Store, StoreError, StoreTx};

use crate::error::{FulfillmentError, Result};

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: common::ProductId,
    pub quantity: u32,
}

/// Builds and cancels orders, each inside one unit of work.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service on top of a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Turns a cart into a pending order.
    ///
    /// Everything happens inside one transaction: the user lookup (committed
    /// state, never a cache), one stock reservation per line in request
    /// order, and the insertion of the header plus its lines with prices
    /// snapshotted at reservation time. Any failure rolls the whole unit of
    /// work back, earlier reservations included, so callers never observe a
    /// half-written order or a decrement without an order row.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, user_id: UserId, lines: Vec<OrderLine>) -> Result<Order> {
        if lines.is_empty() {
            return Err(DomainError::EmptyOrder.into());
        }
        if let Some(line) = lines.iter().find(|l| l.quantity == 0) {
            return Err(DomainError::InvalidQuantity {
                product_id: line.product_id,
            }
            .into());
        }

        let mut tx = self.store.begin().await?;

        let user = tx
            .get_user(user_id)
            .await?
            .ok_or(FulfillmentError::UserNotFound(user_id))?;
        if !user.active {
            return Err(DomainError::Validation(format!(
                "user {} is not active",
                user.email
            ))
            .into());
        }

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = tx
                .reserve_stock(line.product_id, line.quantity)
                .await
                .map_err(|e| match e {
                    StoreError::NotFound { .. } => {
                        FulfillmentError::ProductNotFound(line.product_id)
                    }
                    other => other.into(),
                })?;
            if !product.available {
                return Err(DomainError::Validation(format!(
                    "product {} is not available",
                    product.name
                ))
                .into());
            }
            items.push(OrderItem::new(
                line.product_id,
                product.name,
                line.quantity,
                product.price,
            ));
        }

        let order = Order::new(user_id, items)?;
        tx.stage_insert_order(order.clone());
        tx.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.total, "order created");
        Ok(order)
    }

    /// Cancels a pending order, releasing exactly the reserved quantities.
    ///
    /// The releases and the status flip commit together; the flip is guarded
    /// by the pending status at commit time, so a payment confirmed
    /// concurrently makes the whole cancellation fail without restocking,
    /// and a second cancel can never double-release.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))?;
        if !order.status.can_cancel() {
            return Err(FulfillmentError::InvalidState {
                status: order.status,
                action: "cancel",
            });
        }

        for item in &order.items {
            match tx.release_stock(item.product_id, item.quantity).await {
                Ok(()) => {}
                // The product was deleted after the order was placed; there
                // is no row to restock, but the cancellation still proceeds.
                Err(StoreError::NotFound { .. }) => {
                    tracing::warn!(
                        order_id = %order_id,
                        product_id = %item.product_id,
                        "skipping restock for deleted product"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut cancelled = order;
        cancelled.status = OrderStatus::Cancelled;
        tx.stage_update_order(cancelled.clone(), OrderStatus::Pending);
        tx.commit().await.map_err(|e| match e {
            StoreError::StaleStatus { actual, .. } => FulfillmentError::InvalidState {
                status: actual,
                action: "cancel",
            },
            other => other.into(),
        })?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order_id, "order cancelled");
        Ok(cancelled)
    }

    /// Loads an order.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(order_id))
    }

    /// Direct status override with no business rule beyond existence.
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        self.store
            .set_order_status(order_id, status)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => FulfillmentError::OrderNotFound(order_id),
                other => other.into(),
            })
    }
}
