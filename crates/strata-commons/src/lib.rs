//! # strata-commons
//!
//! Shared building blocks for the stratadb storage adapter: typed identifiers,
//! the relational schema model, the row representation, and the error taxonomy
//! used across the workspace.
//!
//! ## Architecture
//!
//! ```text
//! strata-engine (row keys, scan planning, metadata)
//!     ↓
//! strata-commons (ids, schemas, rows, errors)   ← this crate
//!     ↑
//! strata-store (ordered key-value abstraction)
//! ```

pub mod errors;
pub mod ids;
pub mod row;
pub mod schema;

pub use errors::{EngineError, Result};
pub use ids::{ColumnId, IndexId, TableId};
pub use row::{Row, FULL_UUID, ZERO_UUID};
pub use schema::{ColumnSchema, ColumnType, IndexSchema, TableSchema};
