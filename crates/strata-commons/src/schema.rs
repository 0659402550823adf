//! Relational schema model: column types, column/index definitions, and the
//! table schema document persisted by the metadata layer.
//!
//! A [`TableSchema`] is created on table create/alter, read on every row
//! operation, and replaced wholesale on alter. Validation happens once at
//! construction so the hot encode path can assume a well-formed schema.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

/// Column value types supported by the adapter.
///
/// Raw values arrive as fixed-width big-endian bytes for the numeric and
/// temporal types and as plain bytes for `String`/`Binary`; the engine's
/// value codec turns them into order-preserving key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Signed 64-bit integer.
    Long,
    /// Unsigned 64-bit integer.
    ULong,
    /// IEEE-754 double.
    Double,
    /// Variable-length text, canonicalized to lowercase in index keys.
    String,
    /// Variable-length opaque bytes.
    Binary,
    /// Days-based date, carried as a signed 64-bit value.
    Date,
    /// Time of day, carried as a signed 64-bit value.
    Time,
    /// Timestamp, carried as a signed 64-bit value.
    DateTime,
    /// Fixed-point decimal scaled into a signed 64-bit value.
    Decimal,
}

impl ColumnType {
    /// Whether values of this type have a declared maximum length instead of
    /// a fixed 8-byte width.
    pub fn is_variable_width(&self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Binary)
    }
}

/// Definition of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub auto_increment: bool,
    /// Declared maximum byte length, required for variable-width types.
    pub max_length: Option<usize>,
    /// Total significant digits, required for `Decimal`.
    pub precision: Option<u32>,
    /// Digits after the decimal point, required for `Decimal`.
    pub scale: Option<u32>,
}

impl ColumnSchema {
    /// New nullable column of the given type.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            auto_increment: false,
            max_length: None,
            precision: None,
            scale: None,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the column auto-increment.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Declare the maximum byte length for a variable-width column.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Declare precision and scale for a decimal column.
    pub fn with_decimal(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }
}

/// Definition of an index: an ordered list of column names (the byte
/// concatenation order of the index key) and a uniqueness flag.
///
/// Uniqueness is persisted and surfaced to the relational layer; enforcement
/// belongs there, since the adapter's multi-key writes are not serialized
/// against concurrent writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            columns,
            unique,
        }
    }
}

/// Full schema of one table: its ordered columns and its indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnSchema>,
    indices: Vec<IndexSchema>,
}

impl TableSchema {
    /// Build and validate a table schema.
    ///
    /// Rejects: empty column lists, duplicate column or index names,
    /// variable-width columns without a max length, decimal columns without
    /// precision/scale, indices over unknown columns, and more than one
    /// auto-increment column.
    pub fn new(columns: Vec<ColumnSchema>, indices: Vec<IndexSchema>) -> Result<Self> {
        if columns.is_empty() {
            return Err(EngineError::invalid_argument(
                "table schema requires at least one column",
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for column in &columns {
            if column.name.is_empty() {
                return Err(EngineError::invalid_argument("column name must not be empty"));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(EngineError::invalid_argument(format!(
                    "duplicate column name: {}",
                    column.name
                )));
            }
            if column.column_type.is_variable_width() && column.max_length.is_none() {
                return Err(EngineError::invalid_argument(format!(
                    "column {} requires a declared max length",
                    column.name
                )));
            }
            if column.column_type == ColumnType::Decimal
                && (column.precision.is_none() || column.scale.is_none())
            {
                return Err(EngineError::invalid_argument(format!(
                    "decimal column {} requires precision and scale",
                    column.name
                )));
            }
        }

        if columns.iter().filter(|c| c.auto_increment).count() > 1 {
            return Err(EngineError::invalid_argument(
                "at most one auto-increment column is allowed",
            ));
        }

        let mut index_names = std::collections::HashSet::new();
        for index in &indices {
            if index.name.is_empty() {
                return Err(EngineError::invalid_argument("index name must not be empty"));
            }
            if !index_names.insert(index.name.as_str()) {
                return Err(EngineError::invalid_argument(format!(
                    "duplicate index name: {}",
                    index.name
                )));
            }
            if index.columns.is_empty() {
                return Err(EngineError::invalid_argument(format!(
                    "index {} must cover at least one column",
                    index.name
                )));
            }
            for column in &index.columns {
                if !seen.contains(column.as_str()) {
                    return Err(EngineError::invalid_argument(format!(
                        "index {} references unknown column {}",
                        index.name, column
                    )));
                }
            }
        }

        Ok(Self { columns, indices })
    }

    /// All columns in declaration order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All indices in declaration order.
    pub fn indices(&self) -> &[IndexSchema] {
        &self.indices
    }

    /// Look up an index by name.
    pub fn index(&self, name: &str) -> Option<&IndexSchema> {
        self.indices.iter().find(|i| i.name == name)
    }

    /// The auto-increment column, if the table has one.
    pub fn auto_increment_column(&self) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.auto_increment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_column(name: &str) -> ColumnSchema {
        ColumnSchema::new(name, ColumnType::Long)
    }

    #[test]
    fn test_schema_construction() {
        let schema = TableSchema::new(
            vec![
                long_column("id").not_nullable().auto_increment(),
                ColumnSchema::new("name", ColumnType::String).with_max_length(32),
            ],
            vec![IndexSchema::new("by_name", vec!["name".into()], false)],
        )
        .unwrap();

        assert_eq!(schema.columns().len(), 2);
        assert!(schema.column("name").is_some());
        assert!(schema.index("by_name").is_some());
        assert_eq!(schema.auto_increment_column().unwrap().name, "id");
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = TableSchema::new(vec![long_column("a"), long_column("a")], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_string_without_max_length_rejected() {
        let result = TableSchema::new(vec![ColumnSchema::new("s", ColumnType::String)], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_decimal_requires_precision_and_scale() {
        let result = TableSchema::new(vec![ColumnSchema::new("d", ColumnType::Decimal)], vec![]);
        assert!(result.is_err());

        let ok = TableSchema::new(
            vec![ColumnSchema::new("d", ColumnType::Decimal).with_decimal(10, 2)],
            vec![],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_index_over_unknown_column_rejected() {
        let result = TableSchema::new(
            vec![long_column("a")],
            vec![IndexSchema::new("bad", vec!["missing".into()], false)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_schema_round_trips_through_json() {
        let schema = TableSchema::new(
            vec![
                long_column("id"),
                ColumnSchema::new("amount", ColumnType::Decimal).with_decimal(12, 4),
            ],
            vec![IndexSchema::new("by_amount", vec!["amount".into()], true)],
        )
        .unwrap();

        let json = serde_json::to_vec(&schema).unwrap();
        let back: TableSchema = serde_json::from_slice(&json).unwrap();
        assert_eq!(schema, back);
    }
}
