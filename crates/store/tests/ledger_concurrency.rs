//! Concurrency properties of the inventory ledger.

use std::sync::Arc;

use common::Money;
use domain::Product;
use store::{MemoryStore, Store, StoreError, StoreTx};
use tokio::sync::Barrier;

async fn store_with_product(stock: u32) -> (MemoryStore, common::ProductId) {
    let store = MemoryStore::new();
    let product = Product::new("Widget", "A widget", Money::from_cents(1000), stock, None);
    let id = product.id;
    store.insert_product(product).await.unwrap();
    (store, id)
}

/// Sum of successful reservations never exceeds the initial stock, and the
/// final stock is exactly the initial stock minus that sum.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_reservations_never_overdraw() {
    const INITIAL_STOCK: u32 = 10;
    const CONTENDERS: usize = 25;

    let (store, id) = store_with_product(INITIAL_STOCK).await;
    let barrier = Arc::new(Barrier::new(CONTENDERS));

    let mut handles = Vec::new();
    for _ in 0..CONTENDERS {
        let store = store.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let mut tx = store.begin().await.unwrap();
            match tx.reserve_stock(id, 1).await {
                Ok(_) => {
                    tx.commit().await.unwrap();
                    1u32
                }
                Err(StoreError::InsufficientStock { .. }) => 0,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }));
    }

    let mut reserved = 0;
    for handle in handles {
        reserved += handle.await.unwrap();
    }

    assert_eq!(reserved, INITIAL_STOCK);
    let final_stock = store.get_product(id).await.unwrap().unwrap().stock;
    assert_eq!(final_stock, 0);
}

/// Mixed reserves and releases linearize to some serial order: the final
/// stock matches the net of the operations that committed.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn mixed_reserves_and_releases_linearize() {
    let (store, id) = store_with_product(100).await;
    let barrier = Arc::new(Barrier::new(40));

    let mut handles = Vec::new();
    for i in 0..40u32 {
        let store = store.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let mut tx = store.begin().await.unwrap();
            if i % 2 == 0 {
                tx.reserve_stock(id, 3).await.unwrap();
                tx.commit().await.unwrap();
                -3i64
            } else {
                tx.release_stock(id, 2).await.unwrap();
                tx.commit().await.unwrap();
                2i64
            }
        }));
    }

    let mut net = 0i64;
    for handle in handles {
        net += handle.await.unwrap();
    }

    let final_stock = store.get_product(id).await.unwrap().unwrap().stock;
    assert_eq!(final_stock as i64, 100 + net);
}

/// A transaction holding a row lock blocks a competing reservation until it
/// resolves, at which point the competitor sees the committed stock.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn competing_reservation_waits_for_lock_holder() {
    let (store, id) = store_with_product(1).await;

    let mut holder = store.begin().await.unwrap();
    holder.reserve_stock(id, 1).await.unwrap();

    let contender_store = store.clone();
    let contender = tokio::spawn(async move {
        let mut tx = contender_store.begin().await.unwrap();
        let result = tx.reserve_stock(id, 1).await;
        drop(tx);
        result
    });

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!contender.is_finished());

    holder.commit().await.unwrap();

    // The holder took the last unit, so the contender must fail.
    let result = contender.await.unwrap();
    assert!(matches!(result, Err(StoreError::InsufficientStock { .. })));
}
