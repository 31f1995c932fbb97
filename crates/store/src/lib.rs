//! Persistence layer for the fulfillment engine.
//!
//! The [`Store`] trait is the contract every collaborator sees: plain reads
//! and writes against committed state, plus [`Store::begin`] which opens a
//! [`StoreTx`] unit of work. A transaction stages its writes privately and
//! makes them durable all at once on commit; dropping it discards
//! everything. Stock mutation goes through the transaction's
//! reserve/release operations, which serialize per product row.

pub mod error;
pub mod locks;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use locks::RowLocks;
pub use memory::MemoryStore;
pub use store::{Store, StoreTx};
