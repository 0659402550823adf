//! Error taxonomy for the storage adapter.
//!
//! One workspace-level enum covers the failure classes the relational layer
//! needs to distinguish: a missing row, a missing table, a value that cannot
//! be encoded, a caller mistake, and a backing-store failure. Scan exhaustion
//! is *not* an error; cursors signal it with `Ok(None)`.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for adapter operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No row exists at the expected data key.
    #[error("Row not found: {0}")]
    RowNotFound(Uuid),

    /// Unknown table name or id.
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A value is outside its column type's representable range, or its raw
    /// form does not match the type's expected width.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Caller mistake: negative id, empty name, malformed query key.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O or connectivity failure from the underlying ordered store.
    /// Surfaced as-is; retry policy belongs to the caller.
    #[error("Backing store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Create a table not found error.
    pub fn table_not_found<S: Into<String>>(table: S) -> Self {
        EngineError::TableNotFound(table.into())
    }

    /// Create an encoding error.
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        EngineError::EncodingError(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        EngineError::InvalidArgument(msg.into())
    }

    /// Create a backing store error.
    pub fn store<S: Into<String>>(msg: S) -> Self {
        EngineError::Store(msg.into())
    }
}

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::table_not_found("orders");
        assert_eq!(err.to_string(), "Table not found: orders");

        let err = EngineError::encoding("negative literal for unsigned column");
        assert_eq!(
            err.to_string(),
            "Encoding error: negative literal for unsigned column"
        );

        let err = EngineError::invalid_argument("table id must be non-negative");
        assert_eq!(
            err.to_string(),
            "Invalid argument: table id must be non-negative"
        );
    }

    #[test]
    fn test_row_not_found_carries_uuid() {
        let uuid = Uuid::new_v4();
        let err = EngineError::RowNotFound(uuid);
        assert!(err.to_string().contains(&uuid.to_string()));
    }
}
