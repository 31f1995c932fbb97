//! Category entity.

use common::CategoryId;
use serde::{Deserialize, Serialize};

/// A product category with an optional parent, forming a tree.
///
/// Children are derived by inverting the parent pointers; see
/// [`crate::tree::build_tree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
}

impl Category {
    /// Creates a new category.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parent_id: Option<CategoryId>,
    ) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            description: description.into(),
            parent_id,
        }
    }
}
