//! Table metadata: persistent name/id/schema records and the memoizing
//! cache in front of them.
//!
//! [`MetadataStore`] owns the layout of the metadata key families and every
//! read/write against them. [`MetadataCache`] memoizes its lookups with
//! per-key single-flight loading and explicit invalidation; all row
//! operations go through the cache, so a steady-state row write touches the
//! backing metadata keys only for counters.

pub mod cache;
pub mod store;

pub use cache::MetadataCache;
pub use store::{ColumnIdMap, MetadataStore};
