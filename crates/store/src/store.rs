//! Store and transaction traits.

use async_trait::async_trait;
use common::{CategoryId, OrderId, ProductId, UserId};
use domain::{Category, Order, OrderStatus, Product, User};

use crate::error::Result;

/// A unit of work.
///
/// Writes staged through a transaction become visible to other readers only
/// when [`StoreTx::commit`] succeeds; dropping the transaction discards them
/// and releases any row locks it holds. Reads see committed state overlaid
/// with the transaction's own staged writes.
#[async_trait]
pub trait StoreTx: Send {
    /// Reads a user from committed state.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Reads a product, reflecting any stock staged by this transaction.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Reads an order from committed state.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Atomically reserves `quantity` units of a product.
    ///
    /// Acquires the product's row lock on first touch and holds it until the
    /// transaction ends, so the stock check and the staged decrement are one
    /// step with respect to every other transaction touching the same row.
    /// Returns a snapshot of the product with the reservation applied; on
    /// `InsufficientStock` nothing is staged.
    async fn reserve_stock(&mut self, id: ProductId, quantity: u32) -> Result<Product>;

    /// Stages the return of `quantity` units to a product, under the same
    /// row lock discipline as [`StoreTx::reserve_stock`].
    async fn release_stock(&mut self, id: ProductId, quantity: u32) -> Result<()>;

    /// Stages a new order (header plus items) for insertion.
    fn stage_insert_order(&mut self, order: Order);

    /// Stages an order update guarded by its expected current status.
    ///
    /// At commit time the whole transaction fails with `StaleStatus` if the
    /// committed order's status no longer matches `expected`.
    fn stage_update_order(&mut self, order: Order, expected: OrderStatus);

    /// Atomically applies every staged write, or none on error.
    async fn commit(self) -> Result<()>;

    /// Discards all staged writes and releases row locks.
    fn rollback(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Persistence contract for the fulfillment engine.
///
/// The plain methods read and write committed state directly and are what
/// the collaborator CRUD surface uses. Multi-step writes that must be
/// all-or-nothing go through [`Store::begin`].
#[async_trait]
pub trait Store: Send + Sync {
    /// The transaction type produced by [`Store::begin`].
    type Tx: StoreTx;

    /// Opens a new unit of work.
    async fn begin(&self) -> Result<Self::Tx>;

    // -- Users --

    /// Inserts a user, enforcing email uniqueness.
    async fn insert_user(&self, user: User) -> Result<()>;

    /// Reads a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    // -- Products --

    /// Inserts a product.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Reads a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Updates a product's catalog fields.
    ///
    /// The stored stock value is preserved: stock only moves through the
    /// ledger operations on [`StoreTx`].
    async fn update_product(&self, product: Product) -> Result<Product>;

    /// Deletes a product.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// Lists all products.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Case-insensitive substring search over available products.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>>;

    // -- Categories --

    /// Inserts a category.
    async fn insert_category(&self, category: Category) -> Result<()>;

    /// Reads a category by id.
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Lists all categories.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    // -- Orders --

    /// Reads an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Atomically moves an order from `from` to `to`, recording the payment
    /// reference if given. Fails with `StaleStatus` when the order is not in
    /// `from`, leaving it untouched.
    async fn transition_order(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        payment_ref: Option<String>,
    ) -> Result<Order>;

    /// Overwrites an order's status with no precondition beyond existence.
    /// Does not touch stock; this is the operator escape hatch behind
    /// `PATCH /orders/:id/status`.
    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order>;
}
