//! The consumed capability of the underlying ordered store.
//!
//! All keys live in a single logical namespace (the "column family" concept
//! of wide-column stores collapses to one family here), and every value is a
//! whole serialized payload stored under the zero-length qualifier
//! convention, so there is no per-cell column dimension to the API.

use thiserror::Error;

use strata_commons::EngineError;

/// Errors from the backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O or connectivity failure.
    #[error("I/O error: {0}")]
    Io(String),

    /// The store has been closed or torn down.
    #[error("Store is closed")]
    Closed,

    /// Anything else the backend wants to surface.
    #[error("Store error: {0}")]
    Other(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Store(err.to_string())
    }
}

/// Result type alias using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

/// Owned forward iterator over `(key, value)` pairs in byte order.
///
/// The iterator owns whatever backend resource (snapshot, scanner, network
/// cursor) the scan holds; dropping it releases that resource.
pub type KvIterator = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + Send>;

/// A single operation inside a write batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert or overwrite a key.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove a key (idempotent).
    Delete { key: Vec<u8> },
}

/// Trait for ordered key-value backends.
///
/// Implementations must be thread-safe (`Send + Sync`); the engine issues
/// concurrent scans and writes against one shared handle.
///
/// ## Ordering contract
///
/// `scan` iterates keys in unsigned byte-lexicographic order over the
/// half-open range `[start, end)`, forward only. The engine never asks a
/// backend to iterate backwards; descending traversal is expressed through
/// a separately-encoded key family.
///
/// ## Batch contract
///
/// `write_batch` applies its operations together as one backend write where
/// the backend supports it. It is a durability/throughput primitive, not a
/// transaction: the engine documents that a data row and its index rows can
/// diverge if the process dies between batches.
pub trait OrderedStore: Send + Sync {
    /// Point lookup. `Ok(None)` when the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite one key.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove one key. Succeeds even if the key is absent.
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Apply a group of puts/deletes as one backend write.
    fn write_batch(&self, ops: Vec<WriteOp>) -> Result<()>;

    /// Forward scan over `[start, end)` in byte order.
    fn scan(&self, start: &[u8], end: &[u8]) -> Result<KvIterator>;

    /// Atomically add `amount` to the counter stored at `counter_key` and
    /// return the new value. A missing counter starts at zero; incrementing
    /// by zero reads the current value without modifying it.
    ///
    /// This is the only read-modify-write primitive the engine uses for
    /// counters; callers must not emulate it with `get` + `put`.
    fn increment(&self, counter_key: &[u8], amount: i64) -> Result<i64>;
}
