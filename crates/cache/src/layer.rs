//! Typed cache layer with the write-path invalidation contract.

use std::time::Duration;

use common::{ProductId, UserId};
use domain::{CategoryNode, Product, User};

use crate::keys;
use crate::ttl::TtlCache;

/// The caches the read paths go through, plus the invalidation hooks every
/// mutator is required to call before returning.
///
/// Invalidation contract, per mutation:
/// - product create/update/delete, and any order create/cancel that moves
///   stock: [`ReadCache::invalidate_product`] per touched product
/// - user create/update: [`ReadCache::invalidate_user`]
/// - category create/update: [`ReadCache::invalidate_category_trees`]
#[derive(Clone)]
pub struct ReadCache {
    pub products: TtlCache<Product>,
    pub users: TtlCache<User>,
    pub search: TtlCache<Vec<Product>>,
    pub trees: TtlCache<CategoryNode>,
}

impl ReadCache {
    /// Creates the cache layer with one TTL shared by every cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            products: TtlCache::new("products", ttl),
            users: TtlCache::new("users", ttl),
            search: TtlCache::new("search", ttl),
            trees: TtlCache::new("trees", ttl),
        }
    }

    /// Drops the product's entry and every cached search result set, since
    /// any of them could contain the pre-mutation product.
    pub async fn invalidate_product(&self, id: ProductId) {
        self.products.invalidate(&keys::product(id)).await;
        self.search.invalidate_prefix(keys::SEARCH_PREFIX).await;
    }

    /// Drops the user's entry.
    pub async fn invalidate_user(&self, id: UserId) {
        self.users.invalidate(&keys::user(id)).await;
    }

    /// Drops every cached category tree. Any tree may contain the mutated
    /// category, so the whole prefix goes.
    pub async fn invalidate_category_trees(&self) {
        self.trees.invalidate_prefix(keys::TREE_PREFIX).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Money;

    fn widget() -> Product {
        Product::new("Widget", "A widget", Money::from_cents(1000), 5, None)
    }

    #[tokio::test]
    async fn product_invalidation_clears_search_results() {
        let cache = ReadCache::new(Duration::from_secs(60));
        let product = widget();

        cache
            .products
            .insert(keys::product(product.id), product.clone())
            .await;
        cache
            .search
            .insert(keys::search("widget"), vec![product.clone()])
            .await;
        cache
            .search
            .insert(keys::search("gadget"), vec![])
            .await;

        cache.invalidate_product(product.id).await;

        assert!(cache.products.get(&keys::product(product.id)).await.is_none());
        assert!(cache.search.get(&keys::search("widget")).await.is_none());
        assert!(cache.search.get(&keys::search("gadget")).await.is_none());
    }

    #[tokio::test]
    async fn user_invalidation_is_scoped_to_that_user() {
        let cache = ReadCache::new(Duration::from_secs(60));
        let ada = User::new("ada@example.com", "Ada").unwrap();
        let bob = User::new("bob@example.com", "Bob").unwrap();

        cache.users.insert(keys::user(ada.id), ada.clone()).await;
        cache.users.insert(keys::user(bob.id), bob.clone()).await;

        cache.invalidate_user(ada.id).await;

        assert!(cache.users.get(&keys::user(ada.id)).await.is_none());
        assert!(cache.users.get(&keys::user(bob.id)).await.is_some());
    }
}
