//! Index row key construction.
//!
//! An index key is assembled from either a full row (the write path) or a
//! partial query key (the scan path). The two paths treat a missing column
//! differently, and the difference is load-bearing:
//!
//! - from a **row**, a missing index column is an explicit SQL NULL and
//!   contributes a null-flag segment;
//! - from a **query key**, a missing column ends the key, since query keys
//!   are prefixes used as range bounds.
//!
//! Each present column contributes `[null-flag][encoded value]`; the flag
//! participates in ordering so NULLs take a consistent position relative to
//! every non-null value. The row UUID is appended last as the tie-break, so
//! rows with identical indexed values stay individually addressable.

use uuid::Uuid;

use strata_commons::{EngineError, IndexId, IndexSchema, Result, Row, TableId, TableSchema, ZERO_UUID};

use crate::codec::value;
use crate::rowkey::RowKey;
use crate::scan::QueryKey;

/// Direction of an index key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    /// Flag byte marking a NULL field segment. Ascending keys use `0x00` so
    /// NULL sorts before every non-null value; descending keys invert the
    /// flag so the same policy holds when walking the descending family.
    pub fn null_flag(&self) -> u8 {
        match self {
            SortOrder::Ascending => 0x00,
            SortOrder::Descending => 0x01,
        }
    }

    /// Flag byte marking a non-NULL field segment.
    pub fn not_null_flag(&self) -> u8 {
        match self {
            SortOrder::Ascending => 0x01,
            SortOrder::Descending => 0x00,
        }
    }
}

enum FieldSource<'a> {
    /// No values: the bare index prefix, used for whole-index bounds.
    None,
    /// Full row; absent index columns become explicit NULL segments.
    Row(&'a Row),
    /// Partial query key; iteration stops at the first absent column.
    Query(&'a QueryKey),
}

/// Builder assembling ascending or descending index row keys.
///
/// Table and index ids arrive pre-validated as typed ids; the sort order is
/// a required constructor argument, so a key can never be built without one.
/// The UUID defaults to the zero sentinel, which is what range-bound
/// construction wants; the write path overrides it with the row's UUID.
pub struct IndexKeyBuilder<'a> {
    table_id: TableId,
    index_id: IndexId,
    schema: &'a TableSchema,
    index: &'a IndexSchema,
    order: SortOrder,
    uuid: Uuid,
    source: FieldSource<'a>,
}

impl<'a> IndexKeyBuilder<'a> {
    /// Create a builder for one index of one table.
    ///
    /// Fails with `InvalidArgument` if the named index does not exist in the
    /// schema.
    pub fn new(
        table_id: TableId,
        index_id: IndexId,
        schema: &'a TableSchema,
        index_name: &str,
        order: SortOrder,
    ) -> Result<Self> {
        let index = schema.index(index_name).ok_or_else(|| {
            EngineError::invalid_argument(format!("unknown index: {}", index_name))
        })?;
        Ok(Self {
            table_id,
            index_id,
            schema,
            index,
            order,
            uuid: ZERO_UUID,
            source: FieldSource::None,
        })
    }

    /// Use the given row UUID as the tie-break suffix.
    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    /// Take field values from a full row (insert/delete path).
    pub fn with_row(mut self, row: &'a Row) -> Self {
        self.source = FieldSource::Row(row);
        self
    }

    /// Take field values from a partial query key (scan path).
    pub fn with_query_key(mut self, query_key: &'a QueryKey) -> Self {
        self.source = FieldSource::Query(query_key);
        self
    }

    /// Build the full index row key, UUID suffix included.
    pub fn build(&self) -> Result<RowKey> {
        let fields = self.encode_fields()?;
        Ok(match self.order {
            SortOrder::Ascending => RowKey::AscIndex {
                table_id: self.table_id,
                index_id: self.index_id,
                fields,
                uuid: self.uuid,
            },
            SortOrder::Descending => RowKey::DescIndex {
                table_id: self.table_id,
                index_id: self.index_id,
                fields,
                uuid: self.uuid,
            },
        })
    }

    /// Encoded key bytes without the UUID suffix: the shared prefix of every
    /// row whose indexed values match this builder's fields. Scan planning
    /// derives its range bounds from this.
    pub fn build_prefix(&self) -> Result<Vec<u8>> {
        let mut key = self.build()?.encode();
        key.truncate(key.len() - 16);
        Ok(key)
    }

    fn encode_fields(&self) -> Result<Vec<u8>> {
        let mut fields = Vec::new();
        match self.source {
            FieldSource::None => {}
            FieldSource::Row(row) => {
                for column_name in &self.index.columns {
                    let column = self.schema.column(column_name).ok_or_else(|| {
                        EngineError::invalid_argument(format!(
                            "index {} references unknown column {}",
                            self.index.name, column_name
                        ))
                    })?;
                    match row.get(column_name) {
                        Some(raw) => {
                            fields.push(self.order.not_null_flag());
                            fields.extend(self.encode_value(raw, column)?);
                        }
                        None => fields.push(self.order.null_flag()),
                    }
                }
            }
            FieldSource::Query(query_key) => {
                for column_name in &self.index.columns {
                    let column = self.schema.column(column_name).ok_or_else(|| {
                        EngineError::invalid_argument(format!(
                            "index {} references unknown column {}",
                            self.index.name, column_name
                        ))
                    })?;
                    match query_key.keys().get(column_name) {
                        // Query keys are prefixes: stop at the first column
                        // the caller did not supply.
                        None => break,
                        Some(None) => fields.push(self.order.null_flag()),
                        Some(Some(raw)) => {
                            fields.push(self.order.not_null_flag());
                            fields.extend(self.encode_value(raw, column)?);
                        }
                    }
                }
            }
        }
        Ok(fields)
    }

    fn encode_value(&self, raw: &[u8], column: &strata_commons::ColumnSchema) -> Result<Vec<u8>> {
        match self.order {
            SortOrder::Ascending => value::encode_ascending(raw, column),
            SortOrder::Descending => value::encode_descending(raw, column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use strata_commons::{ColumnSchema, ColumnType};

    use crate::scan::QueryType;

    fn schema() -> TableSchema {
        TableSchema::new(
            vec![
                ColumnSchema::new("score", ColumnType::Long),
                ColumnSchema::new("name", ColumnType::String).with_max_length(4),
            ],
            vec![IndexSchema::new(
                "by_score_name",
                vec!["score".into(), "name".into()],
                false,
            )],
        )
        .unwrap()
    }

    fn ids() -> (TableId, IndexId) {
        (TableId::new(1).unwrap(), IndexId::new(0).unwrap())
    }

    fn row_with(score: Option<i64>, name: Option<&str>) -> Row {
        let mut values = BTreeMap::new();
        if let Some(score) = score {
            values.insert("score".to_string(), score.to_be_bytes().to_vec());
        }
        if let Some(name) = name {
            values.insert("name".to_string(), name.as_bytes().to_vec());
        }
        Row::new(values)
    }

    #[test]
    fn test_unknown_index_rejected() {
        let schema = schema();
        let (table_id, index_id) = ids();
        let result = IndexKeyBuilder::new(table_id, index_id, &schema, "nope", SortOrder::Ascending);
        assert!(matches!(result, Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_row_key_layout_and_uuid_suffix() {
        let schema = schema();
        let (table_id, index_id) = ids();
        let row = row_with(Some(42), Some("ab"));

        let key = IndexKeyBuilder::new(table_id, index_id, &schema, "by_score_name", SortOrder::Ascending)
            .unwrap()
            .with_row(&row)
            .with_uuid(row.uuid())
            .build()
            .unwrap()
            .encode();

        // tag + table(8) + index(8) + [flag + 8] + [flag + 4] + uuid(16)
        assert_eq!(key.len(), 1 + 8 + 8 + 9 + 5 + 16);
        assert!(key.ends_with(row.uuid().as_bytes()));
        // First field segment: non-null flag then sign-flipped 42.
        assert_eq!(key[17], 0x01);
        assert_eq!(key[18], 0x80);
    }

    #[test]
    fn test_missing_row_column_becomes_null_segment() {
        let schema = schema();
        let (table_id, index_id) = ids();
        let row = row_with(None, Some("ab"));

        let key = IndexKeyBuilder::new(table_id, index_id, &schema, "by_score_name", SortOrder::Ascending)
            .unwrap()
            .with_row(&row)
            .build()
            .unwrap()
            .encode();

        // Null segment is the flag byte alone: tag + 16 + 1 + 5 + 16.
        assert_eq!(key.len(), 1 + 8 + 8 + 1 + 5 + 16);
        assert_eq!(key[17], 0x00);
    }

    #[test]
    fn test_query_key_stops_at_first_missing_column() {
        let schema = schema();
        let (table_id, index_id) = ids();
        // Only the second index column supplied: the prefix must be empty,
        // not a null segment for the first column.
        let query = QueryKey::new("by_score_name", QueryType::ExactKey)
            .with_key("name", Some(b"ab".to_vec()));

        let prefix = IndexKeyBuilder::new(table_id, index_id, &schema, "by_score_name", SortOrder::Ascending)
            .unwrap()
            .with_query_key(&query)
            .build_prefix()
            .unwrap();

        assert_eq!(prefix.len(), 1 + 8 + 8);
    }

    #[test]
    fn test_null_sorts_before_values_ascending() {
        let schema = schema();
        let (table_id, index_id) = ids();
        let null_row = row_with(None, Some("ab"));
        let min_row = row_with(Some(i64::MIN), Some("ab"));

        let build = |row: &Row| {
            IndexKeyBuilder::new(table_id, index_id, &schema, "by_score_name", SortOrder::Ascending)
                .unwrap()
                .with_row(row)
                .build()
                .unwrap()
                .encode()
        };
        assert!(build(&null_row) < build(&min_row));
    }

    #[test]
    fn test_null_sorts_last_in_descending_family() {
        let schema = schema();
        let (table_id, index_id) = ids();
        let null_row = row_with(None, Some("ab"));
        let max_row = row_with(Some(i64::MAX), Some("ab"));
        let min_row = row_with(Some(i64::MIN), Some("ab"));

        let build = |row: &Row| {
            IndexKeyBuilder::new(table_id, index_id, &schema, "by_score_name", SortOrder::Descending)
                .unwrap()
                .with_row(row)
                .build()
                .unwrap()
                .encode()
        };
        // Descending family walks large→small; NULL comes after everything.
        assert!(build(&max_row) < build(&min_row));
        assert!(build(&min_row) < build(&null_row));
    }

    #[test]
    fn test_uuid_breaks_ties_between_equal_values() {
        let schema = schema();
        let (table_id, index_id) = ids();
        let row_a = row_with(Some(7), Some("ab"));
        let row_b = row_with(Some(7), Some("ab"));

        let build = |row: &Row| {
            IndexKeyBuilder::new(table_id, index_id, &schema, "by_score_name", SortOrder::Ascending)
                .unwrap()
                .with_row(row)
                .with_uuid(row.uuid())
                .build()
                .unwrap()
                .encode()
        };
        let key_a = build(&row_a);
        let key_b = build(&row_b);
        assert_ne!(key_a, key_b);
        // Keys share everything except the uuid suffix.
        assert_eq!(key_a[..key_a.len() - 16], key_b[..key_b.len() - 16]);
    }

    #[test]
    fn test_descending_values_complement_ascending() {
        let schema = schema();
        let (table_id, index_id) = ids();
        let row = row_with(Some(42), Some("ab"));

        let asc = IndexKeyBuilder::new(table_id, index_id, &schema, "by_score_name", SortOrder::Ascending)
            .unwrap()
            .with_row(&row)
            .build_prefix()
            .unwrap();
        let desc = IndexKeyBuilder::new(table_id, index_id, &schema, "by_score_name", SortOrder::Descending)
            .unwrap()
            .with_row(&row)
            .build_prefix()
            .unwrap();

        // Skip tag/table/index prefix; field segments are flag-inverted and
        // value-complemented.
        let asc_fields = &asc[17..];
        let desc_fields = &desc[17..];
        assert_eq!(asc_fields.len(), desc_fields.len());
        assert_eq!(asc_fields[0], 0x01);
        assert_eq!(desc_fields[0], 0x00);
        for (a, d) in asc_fields[1..9].iter().zip(desc_fields[1..9].iter()) {
            assert_eq!(*a, !*d);
        }
    }
}
