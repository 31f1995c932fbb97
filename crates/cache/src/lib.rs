//! Read-through caching for the query side of the engine.
//!
//! [`TtlCache`] is a generic get-or-populate cache with per-entry TTL and
//! explicit invalidation. [`keys`] derives cache keys from the full identity
//! of each request, and [`ReadCache`] bundles the typed caches together with
//! the write-path invalidation contract.
//!
//! The cache is never a system of record: a miss always falls through to the
//! authoritative store, and TTL expiry only bounds staleness. Mutators must
//! invalidate synchronously before returning.

pub mod keys;
pub mod layer;
pub mod ttl;

pub use layer::ReadCache;
pub use ttl::TtlCache;
