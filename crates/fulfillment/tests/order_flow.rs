//! End-to-end order lifecycle tests against the in-memory store.

use std::sync::Arc;

use common::{Money, ProductId, UserId};
use domain::{OrderStatus, Product, User};
use fulfillment::{
    FulfillmentError, InMemoryGateway, OrderLine, OrderService, PaymentExecutor, RetryPolicy,
};
use store::{MemoryStore, Store};
use tokio::sync::Barrier;

async fn seed_user(store: &MemoryStore) -> UserId {
    let user = User::new("ada@example.com", "Ada").unwrap();
    let id = user.id;
    store.insert_user(user).await.unwrap();
    id
}

async fn seed_product(store: &MemoryStore, name: &str, cents: i64, stock: u32) -> ProductId {
    let product = Product::new(name, "", Money::from_cents(cents), stock, None);
    let id = product.id;
    store.insert_product(product).await.unwrap();
    id
}

fn line(product_id: ProductId, quantity: u32) -> OrderLine {
    OrderLine {
        product_id,
        quantity,
    }
}

/// The widget scenario: order 3 of 5, fail on 3 more, cancel back to 5.
#[tokio::test]
async fn widget_order_cancel_round_trip() {
    let store = MemoryStore::new();
    let service = OrderService::new(store.clone());
    let user_id = seed_user(&store).await;
    let widget = seed_product(&store, "Widget", 1000, 5).await;

    let order = service
        .create_order(user_id, vec![line(widget, 3)])
        .await
        .unwrap();
    assert_eq!(order.total.cents(), 3000);
    assert_eq!(store.get_product(widget).await.unwrap().unwrap().stock, 2);

    let err = service
        .create_order(user_id, vec![line(widget, 3)])
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::InsufficientStock { .. }));
    assert_eq!(store.get_product(widget).await.unwrap().unwrap().stock, 2);

    let cancelled = service.cancel_order(order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(store.get_product(widget).await.unwrap().unwrap().stock, 5);
}

/// Full lifecycle: create, pay through the retry executor, then try to
/// cancel the confirmed order.
#[tokio::test]
async fn pay_then_cancel_is_rejected() {
    let store = MemoryStore::new();
    let service = OrderService::new(store.clone());
    let gateway = InMemoryGateway::new();
    let executor = PaymentExecutor::new(store.clone(), gateway.clone(), RetryPolicy::default());
    let user_id = seed_user(&store).await;
    let widget = seed_product(&store, "Widget", 1000, 5).await;

    let order = service
        .create_order(user_id, vec![line(widget, 2)])
        .await
        .unwrap();

    let outcome = executor.pay(order.id).await.unwrap();
    assert_eq!(outcome.order.status, OrderStatus::Confirmed);
    assert_eq!(gateway.charge_count(), 1);

    // A confirmed order can no longer be cancelled, and stock stays spent.
    let err = service.cancel_order(order.id).await.unwrap_err();
    assert!(matches!(
        err,
        FulfillmentError::InvalidState {
            status: OrderStatus::Confirmed,
            ..
        }
    ));
    assert_eq!(store.get_product(widget).await.unwrap().unwrap().stock, 3);
}

/// Concurrent carts against one product never oversell it, whatever the
/// interleaving.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_orders_never_oversell() {
    const STOCK: u32 = 12;
    const SHOPPERS: usize = 30;

    let store = MemoryStore::new();
    let service = Arc::new(OrderService::new(store.clone()));
    let user_id = seed_user(&store).await;
    let widget = seed_product(&store, "Widget", 500, STOCK).await;

    let barrier = Arc::new(Barrier::new(SHOPPERS));
    let mut handles = Vec::new();
    for _ in 0..SHOPPERS {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            match service.create_order(user_id, vec![line(widget, 2)]).await {
                Ok(_) => 2u32,
                Err(FulfillmentError::InsufficientStock { .. }) => 0,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }));
    }

    let mut sold = 0;
    for handle in handles {
        sold += handle.await.unwrap();
    }

    assert_eq!(sold, STOCK);
    assert_eq!(store.get_product(widget).await.unwrap().unwrap().stock, 0);
}

/// Concurrent cancels of one order release its stock exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_cancels_release_once() {
    let store = MemoryStore::new();
    let service = Arc::new(OrderService::new(store.clone()));
    let user_id = seed_user(&store).await;
    let widget = seed_product(&store, "Widget", 500, 10).await;

    let order = service
        .create_order(user_id, vec![line(widget, 4)])
        .await
        .unwrap();
    assert_eq!(store.get_product(widget).await.unwrap().unwrap().stock, 6);

    let barrier = Arc::new(Barrier::new(8));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let order_id = order.id;
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            service.cancel_order(order_id).await.is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(store.get_product(widget).await.unwrap().unwrap().stock, 10);
}
