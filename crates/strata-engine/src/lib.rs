//! # strata-engine
//!
//! The storage-engine adapter core: maps a relational table/row/index model
//! onto an ordered, range-scannable key-value store so a SQL layer can run
//! ordered index scans against a backend that knows nothing about SQL.
//!
//! ## Architecture
//!
//! ```text
//! relational layer (insert/update/delete, index scans)
//!     ↓
//! Engine ── Table ── Cursor                (engine.rs, table.rs)
//!     ↓         ↓
//! MetadataCache │ scan planning            (metadata/, scan.rs)
//!     ↓         ↓
//! MetadataStore │ IndexKeyBuilder          (metadata/, index_key.rs)
//!     ↓         ↓
//!   RowKey model + value codec             (rowkey.rs, codec/)
//!     ↓
//! OrderedStore (strata-store)
//! ```
//!
//! The load-bearing invariant lives in the codec and key layers: within one
//! key family, byte-lexicographic order of encoded keys equals the logical
//! order of the typed values they contain, for both ascending and descending
//! sort. Everything above relies on it: a forward byte-range scan of the
//! right family *is* an ordered index scan.
//!
//! ## What the adapter does not promise
//!
//! One logical row becomes one data key plus two index keys per index (plus
//! null-index keys). Those writes are batched but not transactional: a crash
//! between batches can leave a data row and its index entries inconsistent.
//! Reconciliation is the caller's concern, as is retrying transient store
//! failures.

pub mod codec;
pub mod engine;
pub mod index_key;
pub mod metadata;
pub mod rowkey;
pub mod scan;
pub mod table;
pub mod validate;

pub use engine::Engine;
pub use index_key::{IndexKeyBuilder, SortOrder};
pub use metadata::{ColumnIdMap, MetadataCache, MetadataStore};
pub use rowkey::RowKey;
pub use scan::{KeyRange, PlannedScan, QueryKey, QueryType};
pub use table::{Cursor, Table};
