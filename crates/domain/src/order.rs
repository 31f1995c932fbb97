//! Order entity and state machine.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Confirmed
///           └──► Cancelled
/// ```
///
/// Both `Confirmed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order is persisted and awaiting payment.
    #[default]
    Pending,

    /// Payment succeeded (terminal).
    Confirmed,

    /// Order was cancelled and its stock released (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can be charged in this status.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Cancelled)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::Validation(format!(
                "unknown order status {other:?}"
            ))),
        }
    }
}

/// A line in an order.
///
/// `unit_price` and `product_name` are snapshots taken when the order was
/// created; later catalog changes never alter them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order line.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the line total (quantity * snapshot unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// An order header together with its lines.
///
/// Created atomically with its items; after creation only `status` and
/// `payment_ref` ever change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    /// Transaction id assigned by the payment gateway on confirmation.
    pub payment_ref: Option<String>,
}

impl Order {
    /// Creates a pending order from snapshot lines, computing the total.
    ///
    /// Fails if there are no lines or any line has a zero quantity.
    pub fn new(user_id: UserId, items: Vec<OrderItem>) -> Result<Self, DomainError> {
        if items.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        if let Some(item) = items.iter().find(|i| i.quantity == 0) {
            return Err(DomainError::InvalidQuantity {
                product_id: item.product_id,
            });
        }

        let mut total = Money::zero();
        for item in &items {
            total += item.line_total();
        }

        Ok(Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Pending,
            total,
            created_at: Utc::now(),
            items,
            payment_ref: None,
        })
    }
}
