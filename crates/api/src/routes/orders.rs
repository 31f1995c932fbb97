//! Order lifecycle endpoints: create, read, pay, cancel, status override.

use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cache::ReadCache;
use common::{OrderId, ProductId, UserId};
use domain::{Order, OrderStatus};
use fulfillment::{OrderLine, OrderService, PaymentExecutor, PaymentGateway};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::parse_uuid;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store, G: PaymentGateway> {
    pub store: S,
    pub orders: OrderService<S>,
    pub payments: PaymentExecutor<S, G>,
    pub cache: ReadCache,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct StatusOverrideRequest {
    pub status: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
    pub payment_ref: Option<String>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct PayResponse {
    pub transaction_id: String,
    pub order: OrderResponse,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price.cents(),
                line_total_cents: item.line_total().cents(),
            })
            .collect();

        OrderResponse {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            status: order.status.to_string(),
            total_cents: order.total.cents(),
            items,
            payment_ref: order.payment_ref,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /orders — build a pending order from a cart.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user_id = UserId::from_uuid(parse_uuid(&req.user_id)?);

    let mut lines = Vec::with_capacity(req.items.len());
    for item in &req.items {
        lines.push(OrderLine {
            product_id: ProductId::from_uuid(parse_uuid(&item.product_id)?),
            quantity: item.quantity,
        });
    }

    let order = state.orders.create_order(user_id, lines).await?;

    // The reservation changed each product's stock.
    for item in &order.items {
        state.cache.invalidate_product(item.product_id).await;
    }

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:id — load an order.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&id)?);
    let order = state.orders.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/pay — charge a pending order through the retry executor.
#[tracing::instrument(skip(state))]
pub async fn pay<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<PayResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&id)?);
    let outcome = state.payments.pay(order_id).await?;

    Ok(Json(PayResponse {
        transaction_id: outcome.transaction_id,
        order: outcome.order.into(),
    }))
}

/// POST /orders/:id/cancel — cancel a pending order, restocking its lines.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&id)?);
    let order = state.orders.cancel_order(order_id).await?;

    // The release changed each product's stock.
    for item in &order.items {
        state.cache.invalidate_product(item.product_id).await;
    }

    Ok(Json(order.into()))
}

/// PATCH /orders/:id/status — operator status override. Does not touch stock.
#[tracing::instrument(skip(state, req))]
pub async fn set_status<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
    Json(req): Json<StatusOverrideRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&id)?);
    let status = OrderStatus::from_str(&req.status)
        .map_err(|_| ApiError::BadRequest(format!("unknown order status: {}", req.status)))?;

    let order = state.orders.set_status(order_id, status).await?;
    Ok(Json(order.into()))
}
