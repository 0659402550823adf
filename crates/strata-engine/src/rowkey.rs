//! The row-key model: every key the adapter writes, as a closed tagged union.
//!
//! A key serializes to `[tag:1][fields...]`. The tag byte selects the family
//! and its layout; within one family, byte order of encoded keys equals the
//! family's declared logical order. Tags are assigned so that the families a
//! single scan walks are contiguous, and all per-table scans are bounded by
//! `table_id` and `table_id + 1` within one tag.
//!
//! Layouts:
//!
//! | family        | layout                                                    |
//! |---------------|-----------------------------------------------------------|
//! | Tables        | tag                                                       |
//! | Columns       | tag, table_id(8)                                          |
//! | ColumnInfo    | tag, table_id(8), column_id(8)                            |
//! | Schema        | tag, table_id(8)                                          |
//! | Indices       | tag, table_id(8)                                          |
//! | RowCount      | tag, table_id(8)                                          |
//! | AutoIncrement | tag, table_id(8)                                          |
//! | Data          | tag, table_id(8), uuid(16)                                |
//! | AscIndex      | tag, table_id(8), index_id(8), field segments, uuid(16)   |
//! | DescIndex     | tag, table_id(8), index_id(8), field segments, uuid(16)   |
//! | NullIndex     | tag, table_id(8), column_id(8), uuid(16)                  |
//!
//! The metadata families (Tables, Columns, Indices) additionally suffix
//! their keys with var-encoded names; those suffixes are appended by the
//! metadata layer, not modeled here.

use uuid::Uuid;

use strata_commons::{ColumnId, IndexId, TableId};

/// Family tag bytes. Kept adjacent per the scan-contiguity invariant.
const TAG_TABLES: u8 = 0x00;
const TAG_COLUMNS: u8 = 0x01;
const TAG_COLUMN_INFO: u8 = 0x02;
const TAG_SCHEMA: u8 = 0x03;
const TAG_INDICES: u8 = 0x04;
const TAG_ROW_COUNT: u8 = 0x05;
const TAG_AUTO_INCREMENT: u8 = 0x06;
const TAG_DATA: u8 = 0x07;
const TAG_ASC_INDEX: u8 = 0x08;
const TAG_DESC_INDEX: u8 = 0x09;
const TAG_NULL_INDEX: u8 = 0x0A;

/// An immutable row key. Values are ephemeral: they are computed on demand
/// and only their encoded bytes are ever persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKey {
    /// Root of the table-name→id mapping and the table id sequence.
    Tables,
    /// Root of one table's column-name→id mapping and column id sequence.
    Columns { table_id: TableId },
    /// Reverse mapping entry: column id → column name.
    ColumnInfo {
        table_id: TableId,
        column_id: ColumnId,
    },
    /// The table's schema document.
    Schema { table_id: TableId },
    /// Root of one table's index-name→id mapping and index id sequence.
    Indices { table_id: TableId },
    /// The table's row-count counter.
    RowCount { table_id: TableId },
    /// The table's auto-increment counter.
    AutoIncrement { table_id: TableId },
    /// A data row, addressed by table and row uuid.
    Data { table_id: TableId, uuid: Uuid },
    /// An ascending index entry. `fields` is the concatenation of
    /// `[null-flag][encoded value]` segments in index-column order.
    AscIndex {
        table_id: TableId,
        index_id: IndexId,
        fields: Vec<u8>,
        uuid: Uuid,
    },
    /// A descending index entry; same shape as `AscIndex` with complemented
    /// value bytes and the inverted null-flag convention.
    DescIndex {
        table_id: TableId,
        index_id: IndexId,
        fields: Vec<u8>,
        uuid: Uuid,
    },
    /// Membership entry for rows holding SQL NULL in one column.
    NullIndex {
        table_id: TableId,
        column_id: ColumnId,
        uuid: Uuid,
    },
}

impl RowKey {
    /// The family tag byte.
    pub fn tag(&self) -> u8 {
        match self {
            RowKey::Tables => TAG_TABLES,
            RowKey::Columns { .. } => TAG_COLUMNS,
            RowKey::ColumnInfo { .. } => TAG_COLUMN_INFO,
            RowKey::Schema { .. } => TAG_SCHEMA,
            RowKey::Indices { .. } => TAG_INDICES,
            RowKey::RowCount { .. } => TAG_ROW_COUNT,
            RowKey::AutoIncrement { .. } => TAG_AUTO_INCREMENT,
            RowKey::Data { .. } => TAG_DATA,
            RowKey::AscIndex { .. } => TAG_ASC_INDEX,
            RowKey::DescIndex { .. } => TAG_DESC_INDEX,
            RowKey::NullIndex { .. } => TAG_NULL_INDEX,
        }
    }

    /// Serialize to key bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut key = vec![self.tag()];
        match self {
            RowKey::Tables => {}
            RowKey::Columns { table_id }
            | RowKey::Schema { table_id }
            | RowKey::Indices { table_id }
            | RowKey::RowCount { table_id }
            | RowKey::AutoIncrement { table_id } => {
                key.extend_from_slice(&table_id.to_be_bytes());
            }
            RowKey::ColumnInfo {
                table_id,
                column_id,
            } => {
                key.extend_from_slice(&table_id.to_be_bytes());
                key.extend_from_slice(&column_id.to_be_bytes());
            }
            RowKey::Data { table_id, uuid } => {
                key.extend_from_slice(&table_id.to_be_bytes());
                key.extend_from_slice(uuid.as_bytes());
            }
            RowKey::AscIndex {
                table_id,
                index_id,
                fields,
                uuid,
            }
            | RowKey::DescIndex {
                table_id,
                index_id,
                fields,
                uuid,
            } => {
                key.extend_from_slice(&table_id.to_be_bytes());
                key.extend_from_slice(&index_id.to_be_bytes());
                key.extend_from_slice(fields);
                key.extend_from_slice(uuid.as_bytes());
            }
            RowKey::NullIndex {
                table_id,
                column_id,
                uuid,
            } => {
                key.extend_from_slice(&table_id.to_be_bytes());
                key.extend_from_slice(&column_id.to_be_bytes());
                key.extend_from_slice(uuid.as_bytes());
            }
        }
        key
    }
}
