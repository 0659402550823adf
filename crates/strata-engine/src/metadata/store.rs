//! Persistent metadata records.
//!
//! Layout, all under the metadata key families of the row-key model:
//!
//! ```text
//! [Tables]                                   → table id sequence counter
//! [Tables]        ++ var(name)               → var(table id)
//! [Columns t]                                → column id sequence counter
//! [Columns t]     ++ var(column name)        → var(column id)
//! [ColumnInfo t c]                           → column name bytes
//! [Indices t]                                → index id sequence counter
//! [Indices t]     ++ var(index name)         → var(index id)
//! [Schema t]                                 → schema document (JSON)
//! [RowCount t]                               → row count counter
//! [AutoIncrement t]                          → auto-increment counter
//! ```
//!
//! `var(..)` is the varint codec's length-prefixed form: compact, not
//! order-comparable, which is fine here: metadata lookups are point reads
//! and bounded prefix scans, never ordered value scans. The bare family
//! keys double as counter keys; name entries are always longer, so a family
//! scan distinguishes them by length.

use std::collections::HashMap;
use std::sync::Arc;

use strata_commons::{ColumnId, EngineError, IndexId, Result, TableId, TableSchema};
use strata_store::{OrderedStore, WriteOp};

use crate::codec::varint;
use crate::rowkey::RowKey;
use crate::scan::prefix_increment;
use crate::validate;

/// Bidirectional column name ↔ id mapping for one table.
#[derive(Debug, Default, Clone)]
pub struct ColumnIdMap {
    by_name: HashMap<String, ColumnId>,
    by_id: HashMap<ColumnId, String>,
}

impl ColumnIdMap {
    fn insert(&mut self, name: String, id: ColumnId) {
        self.by_name.insert(name.clone(), id);
        self.by_id.insert(id, name);
    }

    /// Id of a column by name.
    pub fn id(&self, name: &str) -> Option<ColumnId> {
        self.by_name.get(name).copied()
    }

    /// Name of a column by id.
    pub fn name(&self, id: ColumnId) -> Option<&str> {
        self.by_id.get(&id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Reads and writes the persistent metadata records.
pub struct MetadataStore {
    store: Arc<dyn OrderedStore>,
}

impl MetadataStore {
    pub fn new(store: Arc<dyn OrderedStore>) -> Self {
        Self { store }
    }

    /// Create a table: allocate a stable id, persist the name mapping, the
    /// per-column and per-index id mappings, and the schema document.
    pub fn create_table(&self, name: &str, schema: &TableSchema) -> Result<TableId> {
        validate::non_empty_name(name, "table name")?;
        if self.lookup_table_id(name)?.is_some() {
            return Err(EngineError::invalid_argument(format!(
                "table already exists: {}",
                name
            )));
        }

        let sequence = self.store.increment(&RowKey::Tables.encode(), 1)?;
        let table_id = TableId::new(sequence - 1)?;

        let mut batch = vec![
            WriteOp::Put {
                key: table_name_key(name),
                value: varint::encode_uint(table_id.as_i64() as u64),
            },
            WriteOp::Put {
                key: RowKey::Schema { table_id }.encode(),
                value: serialize_schema(schema)?,
            },
        ];
        self.register_columns(table_id, schema, &ColumnIdMap::default(), &mut batch)?;
        self.register_indices(table_id, schema, &HashMap::new(), &mut batch)?;
        self.store.write_batch(batch)?;

        log::info!("created table {} with id {}", name, table_id);
        Ok(table_id)
    }

    /// Resolve a table name to its id.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        self.lookup_table_id(name)?
            .ok_or_else(|| EngineError::table_not_found(name))
    }

    fn lookup_table_id(&self, name: &str) -> Result<Option<TableId>> {
        match self.store.get(&table_name_key(name))? {
            Some(value) => {
                let raw = varint::decode_uint(&value)?;
                Ok(Some(TableId::new(raw as i64)?))
            }
            None => Ok(None),
        }
    }

    /// Load a table's schema document.
    pub fn schema(&self, table_id: TableId) -> Result<TableSchema> {
        let value = self
            .store
            .get(&RowKey::Schema { table_id }.encode())?
            .ok_or_else(|| EngineError::table_not_found(table_id.to_string()))?;
        serde_json::from_slice(&value).map_err(|e| EngineError::encoding(e.to_string()))
    }

    /// Load the bidirectional column name ↔ id mapping for a table.
    pub fn column_ids(&self, table_id: TableId) -> Result<ColumnIdMap> {
        let prefix = RowKey::Columns { table_id }.encode();
        let end = family_bound(&prefix)?;
        let mut map = ColumnIdMap::default();
        for (key, value) in self.store.scan(&prefix, &end)? {
            if key.len() == prefix.len() {
                continue; // the bare counter key
            }
            let name_bytes = varint::decode_bytes(&key[prefix.len()..])?;
            let name = String::from_utf8(name_bytes)
                .map_err(|e| EngineError::encoding(e.to_string()))?;
            let id = ColumnId::new(varint::decode_uint(&value)? as i64)?;
            map.insert(name, id);
        }
        if map.is_empty() {
            // A live table always has registered columns.
            return Err(EngineError::table_not_found(table_id.to_string()));
        }
        Ok(map)
    }

    /// Load the index name → id mapping for a table.
    pub fn index_ids(&self, table_id: TableId) -> Result<HashMap<String, IndexId>> {
        let prefix = RowKey::Indices { table_id }.encode();
        let end = family_bound(&prefix)?;
        let mut map = HashMap::new();
        for (key, value) in self.store.scan(&prefix, &end)? {
            if key.len() == prefix.len() {
                continue;
            }
            let name_bytes = varint::decode_bytes(&key[prefix.len()..])?;
            let name = String::from_utf8(name_bytes)
                .map_err(|e| EngineError::encoding(e.to_string()))?;
            let id = IndexId::new(varint::decode_uint(&value)? as i64)?;
            map.insert(name, id);
        }
        if map.is_empty() {
            // Distinguish "no indices" from "no such table".
            self.schema(table_id)?;
        }
        Ok(map)
    }

    /// Replace a table's schema document (alter path), registering ids for
    /// columns and indices the old schema did not have. Existing ids are
    /// stable across alters.
    pub fn replace_schema(&self, table_id: TableId, schema: &TableSchema) -> Result<()> {
        let existing_columns = self.column_ids(table_id)?;
        let existing_indices = self.index_ids(table_id)?;

        let mut batch = vec![WriteOp::Put {
            key: RowKey::Schema { table_id }.encode(),
            value: serialize_schema(schema)?,
        }];
        self.register_columns(table_id, schema, &existing_columns, &mut batch)?;
        self.register_indices(table_id, schema, &existing_indices, &mut batch)?;
        self.store.write_batch(batch)?;

        log::info!("replaced schema of table id {}", table_id);
        Ok(())
    }

    /// Point the name mapping at a new name. Ids are stable across rename,
    /// so no data or index key changes.
    pub fn rename_table(&self, old_name: &str, new_name: &str) -> Result<()> {
        validate::non_empty_name(new_name, "table name")?;
        let table_id = self.table_id(old_name)?;
        if self.lookup_table_id(new_name)?.is_some() {
            return Err(EngineError::invalid_argument(format!(
                "table already exists: {}",
                new_name
            )));
        }
        self.store.write_batch(vec![
            WriteOp::Delete {
                key: table_name_key(old_name),
            },
            WriteOp::Put {
                key: table_name_key(new_name),
                value: varint::encode_uint(table_id.as_i64() as u64),
            },
        ])?;
        log::info!("renamed table {} to {}", old_name, new_name);
        Ok(())
    }

    /// Remove every metadata record of a table. Row and index data must be
    /// removed separately before this is called.
    pub fn drop_table(&self, name: &str) -> Result<TableId> {
        let table_id = self.table_id(name)?;
        let mut batch = vec![
            WriteOp::Delete {
                key: table_name_key(name),
            },
            WriteOp::Delete {
                key: RowKey::Schema { table_id }.encode(),
            },
            WriteOp::Delete {
                key: RowKey::RowCount { table_id }.encode(),
            },
            WriteOp::Delete {
                key: RowKey::AutoIncrement { table_id }.encode(),
            },
        ];
        for prefix in [
            RowKey::Columns { table_id }.encode(),
            RowKey::Indices { table_id }.encode(),
        ] {
            let end = family_bound(&prefix)?;
            for (key, _) in self.store.scan(&prefix, &end)? {
                batch.push(WriteOp::Delete { key });
            }
        }
        {
            // ColumnInfo reverse-mapping rows.
            let mut prefix = RowKey::ColumnInfo {
                table_id,
                column_id: ColumnId::new(0)?,
            }
            .encode();
            prefix.truncate(prefix.len() - 8);
            let end = family_bound(&prefix)?;
            for (key, _) in self.store.scan(&prefix, &end)? {
                batch.push(WriteOp::Delete { key });
            }
        }
        self.store.write_batch(batch)?;
        log::info!("dropped table {} (id {})", name, table_id);
        Ok(table_id)
    }

    /// Current row count; zero for a table that has never counted.
    pub fn row_count(&self, table_id: TableId) -> Result<i64> {
        Ok(self.store.increment(&RowKey::RowCount { table_id }.encode(), 0)?)
    }

    /// Atomically adjust the row count and return the new value.
    pub fn increment_row_count(&self, table_id: TableId, amount: i64) -> Result<i64> {
        Ok(self
            .store
            .increment(&RowKey::RowCount { table_id }.encode(), amount)?)
    }

    /// Reset the row count to zero.
    pub fn truncate_row_count(&self, table_id: TableId) -> Result<()> {
        Ok(self.store.delete(&RowKey::RowCount { table_id }.encode())?)
    }

    /// Current auto-increment value.
    pub fn auto_increment(&self, table_id: TableId) -> Result<i64> {
        Ok(self
            .store
            .increment(&RowKey::AutoIncrement { table_id }.encode(), 0)?)
    }

    /// Atomically advance the auto-increment counter and return the new
    /// value.
    pub fn increment_auto_increment(&self, table_id: TableId, amount: i64) -> Result<i64> {
        Ok(self
            .store
            .increment(&RowKey::AutoIncrement { table_id }.encode(), amount)?)
    }

    /// Reset the auto-increment counter.
    pub fn truncate_auto_increment(&self, table_id: TableId) -> Result<()> {
        Ok(self
            .store
            .delete(&RowKey::AutoIncrement { table_id }.encode())?)
    }

    fn register_columns(
        &self,
        table_id: TableId,
        schema: &TableSchema,
        existing: &ColumnIdMap,
        batch: &mut Vec<WriteOp>,
    ) -> Result<()> {
        let counter_key = RowKey::Columns { table_id }.encode();
        for column in schema.columns() {
            if existing.id(&column.name).is_some() {
                continue;
            }
            let sequence = self.store.increment(&counter_key, 1)?;
            let column_id = ColumnId::new(sequence - 1)?;
            batch.push(WriteOp::Put {
                key: column_name_key(table_id, &column.name),
                value: varint::encode_uint(column_id.as_i64() as u64),
            });
            batch.push(WriteOp::Put {
                key: RowKey::ColumnInfo {
                    table_id,
                    column_id,
                }
                .encode(),
                value: column.name.as_bytes().to_vec(),
            });
        }
        Ok(())
    }

    fn register_indices(
        &self,
        table_id: TableId,
        schema: &TableSchema,
        existing: &HashMap<String, IndexId>,
        batch: &mut Vec<WriteOp>,
    ) -> Result<()> {
        let counter_key = RowKey::Indices { table_id }.encode();
        for index in schema.indices() {
            if existing.contains_key(&index.name) {
                continue;
            }
            let sequence = self.store.increment(&counter_key, 1)?;
            let index_id = IndexId::new(sequence - 1)?;
            batch.push(WriteOp::Put {
                key: index_name_key(table_id, &index.name),
                value: varint::encode_uint(index_id.as_i64() as u64),
            });
        }
        Ok(())
    }
}

fn table_name_key(name: &str) -> Vec<u8> {
    let mut key = RowKey::Tables.encode();
    key.extend_from_slice(&varint::encode_bytes(name.as_bytes()));
    key
}

fn column_name_key(table_id: TableId, name: &str) -> Vec<u8> {
    let mut key = RowKey::Columns { table_id }.encode();
    key.extend_from_slice(&varint::encode_bytes(name.as_bytes()));
    key
}

fn index_name_key(table_id: TableId, name: &str) -> Vec<u8> {
    let mut key = RowKey::Indices { table_id }.encode();
    key.extend_from_slice(&varint::encode_bytes(name.as_bytes()));
    key
}

fn serialize_schema(schema: &TableSchema) -> Result<Vec<u8>> {
    serde_json::to_vec(schema).map_err(|e| EngineError::encoding(e.to_string()))
}

fn family_bound(prefix: &[u8]) -> Result<Vec<u8>> {
    prefix_increment(prefix).ok_or_else(|| {
        EngineError::invalid_argument("metadata prefix has no exclusive upper bound")
    })
}
