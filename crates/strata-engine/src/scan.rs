//! Scan planning: from a logical index query to a byte range.
//!
//! Every query type reduces to one half-open byte range `[start, end)` over
//! one key family, scanned forward. Descending queries never reverse an
//! iterator; they plan over the descending family, whose keys are encoded
//! so that a forward walk yields descending logical order.
//!
//! Range shapes per query type:
//!
//! | query           | family | start               | end                      |
//! |-----------------|--------|---------------------|--------------------------|
//! | `ExactKey`      | asc    | value prefix        | incr(value prefix)       |
//! | `KeyOrNext`     | asc    | value prefix        | incr(index prefix)       |
//! | `AfterKey`      | asc    | value prefix        | incr(index prefix)       |
//! | `KeyOrPrevious` | desc   | value prefix        | incr(index prefix)       |
//! | `BeforeKey`     | desc   | value prefix        | incr(index prefix)       |
//! | `IndexFirst`    | asc    | index prefix        | incr(index prefix)       |
//! | `IndexLast`     | desc   | index prefix        | incr(index prefix)       |
//!
//! `AfterKey`/`BeforeKey` ranges still include rows equal to the boundary;
//! the cursor applies the skip-equal post-filter using the planned
//! `skip_prefix`, keeping range computation and boundary semantics separate.

use std::collections::BTreeMap;

use strata_commons::{EngineError, IndexId, Result, Row, TableId, TableSchema, ZERO_UUID};

use crate::index_key::{IndexKeyBuilder, SortOrder};
use crate::rowkey::RowKey;

/// The closed set of index query types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// Rows whose indexed values equal the supplied key exactly.
    ExactKey,
    /// Rows strictly after the supplied key (skip-equal applies).
    AfterKey,
    /// The supplied key or the next one, walking forward.
    KeyOrNext,
    /// The supplied key or the previous one, walking backward.
    KeyOrPrevious,
    /// Rows strictly before the supplied key (skip-equal applies).
    BeforeKey,
    /// First row of the index in ascending order.
    IndexFirst,
    /// Last row of the index, i.e. first in descending order.
    IndexLast,
}

impl QueryType {
    /// Which physical key family serves this query.
    pub fn sort_order(&self) -> SortOrder {
        match self {
            QueryType::ExactKey
            | QueryType::AfterKey
            | QueryType::KeyOrNext
            | QueryType::IndexFirst => SortOrder::Ascending,
            QueryType::KeyOrPrevious | QueryType::BeforeKey | QueryType::IndexLast => {
                SortOrder::Descending
            }
        }
    }

    /// Whether rows equal to the boundary key must be skipped by the cursor.
    pub fn skips_boundary(&self) -> bool {
        matches!(self, QueryType::AfterKey | QueryType::BeforeKey)
    }
}

/// A logical index query: which index, what kind of positioning, and the
/// supplied key columns. Keys are a *prefix* of the index's column list;
/// a `None` value searches for SQL NULL in that column.
#[derive(Debug, Clone)]
pub struct QueryKey {
    index_name: String,
    query_type: QueryType,
    keys: BTreeMap<String, Option<Vec<u8>>>,
}

impl QueryKey {
    pub fn new(index_name: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            index_name: index_name.into(),
            query_type,
            keys: BTreeMap::new(),
        }
    }

    /// Supply one key column; `None` searches for NULL.
    pub fn with_key(mut self, column: impl Into<String>, value: Option<Vec<u8>>) -> Self {
        self.keys.insert(column.into(), value);
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn keys(&self) -> &BTreeMap<String, Option<Vec<u8>>> {
        &self.keys
    }

    /// Columns this query searches for NULL in.
    pub fn null_search_columns(&self) -> Vec<&str> {
        self.keys
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Half-open byte range `[start, end)` handed to the store's range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

/// A planned index scan: the byte range, the family it runs over, and the
/// boundary prefix the cursor must skip for after/before semantics.
#[derive(Debug, Clone)]
pub struct PlannedScan {
    pub range: KeyRange,
    pub order: SortOrder,
    pub skip_prefix: Option<Vec<u8>>,
}

/// Exclusive upper bound covering exactly the keys sharing `prefix`:
/// increment the last non-`0xFF` byte and truncate. `None` when every byte
/// is `0xFF` and no finite bound exists.
pub fn prefix_increment(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut bound = prefix.to_vec();
    while let Some(last) = bound.last_mut() {
        if *last == 0xFF {
            bound.pop();
        } else {
            *last += 1;
            return Some(bound);
        }
    }
    None
}

/// Range covering every data row of one table: bounded below by the zero
/// UUID and above by the first key of the next table id.
pub fn table_scan_range(table_id: TableId) -> KeyRange {
    KeyRange {
        start: RowKey::Data {
            table_id,
            uuid: ZERO_UUID,
        }
        .encode(),
        end: RowKey::Data {
            table_id: table_id.next(),
            uuid: ZERO_UUID,
        }
        .encode(),
    }
}

/// Range covering one column's null-index entries for one table.
pub fn null_scan_range(table_id: TableId, column_id: strata_commons::ColumnId) -> Result<KeyRange> {
    let mut prefix = RowKey::NullIndex {
        table_id,
        column_id,
        uuid: ZERO_UUID,
    }
    .encode();
    prefix.truncate(prefix.len() - 16);
    let end = prefix_increment(&prefix).ok_or_else(|| {
        EngineError::invalid_argument("null-index prefix has no exclusive upper bound")
    })?;
    Ok(KeyRange { start: prefix, end })
}

/// Plan an index scan for `query` against one index of one table.
pub fn index_scan_range(
    table_id: TableId,
    index_id: IndexId,
    schema: &TableSchema,
    query: &QueryKey,
) -> Result<PlannedScan> {
    let order = query.query_type().sort_order();

    let index_prefix =
        IndexKeyBuilder::new(table_id, index_id, schema, query.index_name(), order)?
            .build_prefix()?;
    let value_prefix =
        IndexKeyBuilder::new(table_id, index_id, schema, query.index_name(), order)?
            .with_query_key(query)
            .build_prefix()?;

    let bound_of = |prefix: &[u8]| {
        prefix_increment(prefix).ok_or_else(|| {
            EngineError::invalid_argument("scan prefix has no exclusive upper bound")
        })
    };

    let range = match query.query_type() {
        QueryType::ExactKey => KeyRange {
            end: bound_of(&value_prefix)?,
            start: value_prefix.clone(),
        },
        QueryType::AfterKey
        | QueryType::KeyOrNext
        | QueryType::BeforeKey
        | QueryType::KeyOrPrevious => KeyRange {
            start: value_prefix.clone(),
            end: bound_of(&index_prefix)?,
        },
        QueryType::IndexFirst | QueryType::IndexLast => KeyRange {
            start: index_prefix.clone(),
            end: bound_of(&index_prefix)?,
        },
    };

    let skip_prefix = if query.query_type().skips_boundary() {
        Some(value_prefix)
    } else {
        None
    };

    log::debug!(
        "planned {:?} scan over index {} of table {}: {} supplied column(s), range [{:02x?}, {:02x?})",
        query.query_type(),
        query.index_name(),
        table_id,
        query.keys().len(),
        range.start,
        range.end,
    );

    Ok(PlannedScan {
        range,
        order,
        skip_prefix,
    })
}

/// Build the index row keys written for one row of one index, in both
/// families. Shared by the insert and delete paths so they always produce
/// identical keys.
pub fn index_keys_for_row(
    table_id: TableId,
    index_id: IndexId,
    schema: &TableSchema,
    index_name: &str,
    row: &Row,
) -> Result<(RowKey, RowKey)> {
    let ascending = IndexKeyBuilder::new(table_id, index_id, schema, index_name, SortOrder::Ascending)?
        .with_row(row)
        .with_uuid(row.uuid())
        .build()?;
    let descending =
        IndexKeyBuilder::new(table_id, index_id, schema, index_name, SortOrder::Descending)?
            .with_row(row)
            .with_uuid(row.uuid())
            .build()?;
    Ok((ascending, descending))
}
