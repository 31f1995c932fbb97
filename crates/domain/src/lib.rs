//! Domain layer: entities, the order state machine, and the category tree
//! builder.
//!
//! Everything here is pure data and rules; persistence lives in the `store`
//! crate and orchestration in the `fulfillment` crate.

pub mod category;
pub mod error;
pub mod order;
pub mod product;
pub mod tree;
pub mod user;

pub use category::Category;
pub use error::DomainError;
pub use order::{Order, OrderItem, OrderStatus};
pub use product::Product;
pub use tree::{CategoryNode, build_tree};
pub use user::User;
