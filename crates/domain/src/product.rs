//! Product entity.

use common::{CategoryId, Money, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// `stock` is only ever mutated through the inventory ledger's
/// reserve/release operations; catalog updates leave it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub available: bool,
    pub category_id: Option<CategoryId>,
}

impl Product {
    /// Creates a new available product.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        stock: u32,
        category_id: Option<CategoryId>,
    ) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: description.into(),
            price,
            stock,
            available: true,
            category_id,
        }
    }
}
