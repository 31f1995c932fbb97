//! Cache key derivation.
//!
//! Keys encode the full identity of the request they cache. The search key
//! in particular includes the normalized query text, so two distinct queries
//! can never collide on one key.

use common::{CategoryId, ProductId, UserId};

/// Prefix shared by all search result keys.
pub const SEARCH_PREFIX: &str = "search:";

/// Prefix shared by all category tree keys.
pub const TREE_PREFIX: &str = "tree:";

/// Key for a single product lookup.
pub fn product(id: ProductId) -> String {
    format!("product:{id}")
}

/// Key for a single user lookup.
pub fn user(id: UserId) -> String {
    format!("user:{id}")
}

/// Key for a product search, derived from the normalized query.
pub fn search(query: &str) -> String {
    format!("{SEARCH_PREFIX}{}", normalize(query))
}

/// Key for the category tree rooted at `id`.
pub fn category_tree(id: CategoryId) -> String {
    format!("{TREE_PREFIX}{id}")
}

/// Lowercases and collapses whitespace so trivially different spellings of
/// the same query share one entry.
pub fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
