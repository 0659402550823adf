//! Typed identifiers for tables, columns, and indices.
//!
//! Ids are stable non-negative integers allocated once by the metadata layer
//! and embedded big-endian inside row keys, so that key bytes sort by id.
//! The newtypes keep a table id from ever being passed where a column id is
//! expected.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

/// Stable numeric identifier for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(i64);

impl TableId {
    /// Create a table id, rejecting negative values.
    pub fn new(id: i64) -> Result<Self> {
        if id < 0 {
            return Err(EngineError::invalid_argument(format!(
                "table id must be non-negative, got {}",
                id
            )));
        }
        Ok(TableId(id))
    }

    /// Raw id value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Big-endian key bytes. Non-negative ids sort correctly as raw
    /// two's-complement bytes, so no sign transform is needed here.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// The id one past this one, used as an exclusive scan bound.
    pub fn next(&self) -> TableId {
        TableId(self.0 + 1)
    }
}

impl std::fmt::Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable numeric identifier for a column within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(i64);

impl ColumnId {
    /// Create a column id, rejecting negative values.
    pub fn new(id: i64) -> Result<Self> {
        if id < 0 {
            return Err(EngineError::invalid_argument(format!(
                "column id must be non-negative, got {}",
                id
            )));
        }
        Ok(ColumnId(id))
    }

    /// Raw id value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Big-endian key bytes.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable numeric identifier for an index within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexId(i64);

impl IndexId {
    /// Create an index id, rejecting negative values.
    pub fn new(id: i64) -> Result<Self> {
        if id < 0 {
            return Err(EngineError::invalid_argument(format!(
                "index id must be non-negative, got {}",
                id
            )));
        }
        Ok(IndexId(id))
    }

    /// Raw id value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Big-endian key bytes.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Display for IndexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
