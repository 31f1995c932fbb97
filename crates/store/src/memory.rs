//! In-memory store implementation.
//!
//! Backs the whole engine in tests and the default server binary. Committed
//! state lives in a set of maps behind one `RwLock`; transactions stage
//! their writes privately and apply them under the write lock on commit, so
//! other readers never observe a partial unit of work.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{CategoryId, OrderId, ProductId, UserId};
use domain::{Category, Order, OrderStatus, Product, User};
use tokio::sync::{OwnedMutexGuard, RwLock};

use crate::error::{Result, StoreError};
use crate::locks::RowLocks;
use crate::store::{Store, StoreTx};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    products: HashMap<ProductId, Product>,
    categories: HashMap<CategoryId, Category>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store with row-scoped stock locking.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    stock_locks: RowLocks<ProductId>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

/// A transaction against a [`MemoryStore`].
///
/// Holds the row locks of every product it has touched until it is
/// committed or dropped.
pub struct MemoryTx {
    tables: Arc<RwLock<Tables>>,
    stock_locks: RowLocks<ProductId>,
    guards: HashMap<ProductId, OwnedMutexGuard<()>>,
    staged_stock: HashMap<ProductId, u32>,
    inserted_orders: Vec<Order>,
    updated_orders: Vec<(Order, OrderStatus)>,
}

impl MemoryTx {
    /// Acquires the row lock for `id` unless this transaction already holds
    /// it. Re-entrant per transaction, so a request listing the same product
    /// twice cannot deadlock on itself.
    async fn lock_row(&mut self, id: ProductId) {
        if !self.guards.contains_key(&id) {
            let guard = self.stock_locks.acquire(id).await;
            self.guards.insert(id, guard);
        }
    }

    async fn committed_product(&self, id: ProductId) -> Option<Product> {
        self.tables.read().await.products.get(&id).cloned()
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let mut product = self.committed_product(id).await;
        if let Some(ref mut product) = product
            && let Some(stock) = self.staged_stock.get(&id)
        {
            product.stock = *stock;
        }
        Ok(product)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn reserve_stock(&mut self, id: ProductId, quantity: u32) -> Result<Product> {
        self.lock_row(id).await;

        let committed = self
            .committed_product(id)
            .await
            .ok_or_else(|| StoreError::not_found("product", id))?;
        let available = *self.staged_stock.get(&id).unwrap_or(&committed.stock);

        if quantity > available {
            return Err(StoreError::InsufficientStock {
                product_id: id,
                name: committed.name.clone(),
                requested: quantity,
                available,
            });
        }

        let remaining = available - quantity;
        self.staged_stock.insert(id, remaining);

        Ok(Product {
            stock: remaining,
            ..committed
        })
    }

    async fn release_stock(&mut self, id: ProductId, quantity: u32) -> Result<()> {
        self.lock_row(id).await;

        let committed = self
            .committed_product(id)
            .await
            .ok_or_else(|| StoreError::not_found("product", id))?;
        let current = *self.staged_stock.get(&id).unwrap_or(&committed.stock);
        self.staged_stock.insert(id, current + quantity);
        Ok(())
    }

    fn stage_insert_order(&mut self, order: Order) {
        self.inserted_orders.push(order);
    }

    fn stage_update_order(&mut self, order: Order, expected: OrderStatus) {
        self.updated_orders.push((order, expected));
    }

    async fn commit(mut self) -> Result<()> {
        let mut tables = self.tables.write().await;

        // Verify every guard before applying anything.
        for (order, expected) in &self.updated_orders {
            let current = tables
                .orders
                .get(&order.id)
                .ok_or_else(|| StoreError::not_found("order", order.id))?;
            if current.status != *expected {
                return Err(StoreError::StaleStatus {
                    order_id: order.id,
                    expected: *expected,
                    actual: current.status,
                });
            }
        }

        for (id, stock) in self.staged_stock.drain() {
            if let Some(product) = tables.products.get_mut(&id) {
                product.stock = stock;
            }
        }
        for order in self.inserted_orders.drain(..) {
            tables.orders.insert(order.id, order);
        }
        for (order, _) in self.updated_orders.drain(..) {
            tables.orders.insert(order.id, order);
        }

        metrics::counter!("store_commits_total").increment(1);
        tracing::debug!(rows = self.guards.len(), "transaction committed");
        Ok(())
        // Row lock guards drop here, after the staged writes are visible.
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        Ok(MemoryTx {
            tables: Arc::clone(&self.tables),
            stock_locks: self.stock_locks.clone(),
            guards: HashMap::new(),
            staged_stock: HashMap::new(),
            inserted_orders: Vec::new(),
            updated_orders: Vec::new(),
        })
    }

    async fn insert_user(&self, user: User) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailInUse(user.email));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        self.tables
            .write()
            .await
            .products
            .insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn update_product(&self, product: Product) -> Result<Product> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .products
            .get_mut(&product.id)
            .ok_or_else(|| StoreError::not_found("product", product.id))?;

        // Stock is owned by the ledger; keep the stored value.
        let updated = Product {
            stock: existing.stock,
            ..product
        };
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        // Wait for any in-flight reservation on this row before removing it.
        let _guard = self.stock_locks.acquire(id).await;
        let mut tables = self.tables.write().await;
        tables
            .products
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("product", id))?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let mut products: Vec<Product> =
            self.tables.read().await.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let needle = query.to_lowercase();
        let mut matches: Vec<Product> = self
            .tables
            .read()
            .await
            .products
            .values()
            .filter(|p| {
                p.available
                    && (p.name.to_lowercase().contains(&needle)
                        || p.description.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    async fn insert_category(&self, category: Category) -> Result<()> {
        self.tables
            .write()
            .await
            .categories
            .insert(category.id, category);
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self
            .tables
            .read()
            .await
            .categories
            .values()
            .cloned()
            .collect())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        payment_ref: Option<String>,
    ) -> Result<Order> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("order", id))?;

        if order.status != from {
            return Err(StoreError::StaleStatus {
                order_id: id,
                expected: from,
                actual: order.status,
            });
        }

        order.status = to;
        if payment_ref.is_some() {
            order.payment_ref = payment_ref;
        }
        Ok(order.clone())
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("order", id))?;
        order.status = status;
        Ok(order.clone())
    }
}
