//! Category tree construction.
//!
//! The tree builder only ever walks a children-only adjacency index derived
//! from the stored parent pointers. It never follows a parent reference, so
//! it terminates for any starting node, and a visited set guards against a
//! corrupted graph that happens to contain a cycle.

use std::collections::{HashMap, HashSet};

use common::CategoryId;
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// A node in the downward-only category hierarchy view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub children: Vec<CategoryNode>,
}

/// Builds the subtree rooted at `root` from a flat category list.
///
/// Returns `None` if `root` is not present in `categories`. Children are
/// ordered by name for a stable output.
pub fn build_tree(root: CategoryId, categories: &[Category]) -> Option<CategoryNode> {
    let by_id: HashMap<CategoryId, &Category> = categories.iter().map(|c| (c.id, c)).collect();

    let mut children_of: HashMap<CategoryId, Vec<&Category>> = HashMap::new();
    for category in categories {
        if let Some(parent_id) = category.parent_id {
            children_of.entry(parent_id).or_default().push(category);
        }
    }
    for children in children_of.values_mut() {
        children.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let root_category = by_id.get(&root)?;
    let mut visited = HashSet::new();
    Some(descend(root_category, &children_of, &mut visited))
}

fn descend(
    category: &Category,
    children_of: &HashMap<CategoryId, Vec<&Category>>,
    visited: &mut HashSet<CategoryId>,
) -> CategoryNode {
    visited.insert(category.id);

    let mut children = Vec::new();
    if let Some(child_categories) = children_of.get(&category.id) {
        for child in child_categories {
            if !visited.contains(&child.id) {
                children.push(descend(child, children_of, visited));
            }
        }
    }

    CategoryNode {
        id: category.id,
        name: category.name.clone(),
        children,
    }
}
