//! The row model: a 128-bit row identifier plus a column→bytes mapping.
//!
//! A row's UUID is its physical identity. It appears in the data row key and
//! as the tie-breaker suffix of every index key, so rows with identical
//! indexed values stay individually addressable. An absent entry in the
//! value map is SQL NULL; there is no empty-bytes-means-null convention.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{EngineError, Result};

/// All-zero UUID, used only as an inclusive lower scan bound.
pub const ZERO_UUID: Uuid = Uuid::from_bytes([0x00; 16]);

/// All-ones UUID, used only as an upper scan bound. Never assigned to a row.
pub const FULL_UUID: Uuid = Uuid::from_bytes([0xFF; 16]);

/// One logical table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    uuid: Uuid,
    values: BTreeMap<String, Vec<u8>>,
}

impl Row {
    /// New row with a freshly generated identifier.
    pub fn new(values: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            values,
        }
    }

    /// New row with an explicit identifier (used when replaying or updating).
    pub fn with_uuid(uuid: Uuid, values: BTreeMap<String, Vec<u8>>) -> Self {
        Self { uuid, values }
    }

    /// The row's physical identifier.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The raw value map. Absent column = SQL NULL.
    pub fn values(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.values
    }

    /// Raw bytes for one column, or `None` for SQL NULL.
    pub fn get(&self, column: &str) -> Option<&[u8]> {
        self.values.get(column).map(|v| v.as_slice())
    }

    /// Set one column value.
    pub fn set(&mut self, column: impl Into<String>, value: Vec<u8>) {
        self.values.insert(column.into(), value);
    }

    /// Serialize to the persisted row payload.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| EngineError::encoding(e.to_string()))
    }

    /// Deserialize a persisted row payload.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| EngineError::encoding(e.to_string()))
    }
}
