//! Row operations against one open table.
//!
//! One logical row fans out to several physical keys: the data row, an
//! ascending and a descending entry per index, and a null-index entry per
//! NULL index column. Insert and delete build the same key set from the same
//! row, so the families stay in step. But the writes are batched, not
//! transactional, and a crash between batches can leave them inconsistent.
//! That gap is documented, not papered over.

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use strata_commons::{EngineError, Result, Row, TableId, TableSchema};
use strata_store::{KvIterator, OrderedStore, WriteOp};

use crate::metadata::{MetadataCache, MetadataStore};
use crate::rowkey::RowKey;
use crate::scan::{self, QueryKey};

/// Flush threshold for bulk delete batches.
const MAX_BATCH_OPS: usize = 1024;

/// An open table: resolved id, pinned schema, and the handles needed to
/// read and write its keys.
pub struct Table {
    store: Arc<dyn OrderedStore>,
    metadata: Arc<MetadataStore>,
    cache: Arc<MetadataCache>,
    table_id: TableId,
    schema: Arc<TableSchema>,
}

impl Table {
    pub(crate) fn new(
        store: Arc<dyn OrderedStore>,
        metadata: Arc<MetadataStore>,
        cache: Arc<MetadataCache>,
        table_id: TableId,
        schema: Arc<TableSchema>,
    ) -> Self {
        Self {
            store,
            metadata,
            cache,
            table_id,
            schema,
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Insert a row: one data key plus both index entries per index, plus
    /// null-index entries, in one write batch. Returns the row's UUID.
    ///
    /// If the schema has an auto-increment column the row does not supply,
    /// the column is filled from the table's auto-increment counter.
    pub fn insert(&self, row: &Row) -> Result<Uuid> {
        let row = self.with_auto_increment(row)?;
        let serialized = row.serialize()?;

        let mut ops = vec![WriteOp::Put {
            key: RowKey::Data {
                table_id: self.table_id,
                uuid: row.uuid(),
            }
            .encode(),
            value: serialized.clone(),
        }];
        self.append_index_ops(&row, Some(&serialized), &mut ops)?;
        self.store.write_batch(ops)?;

        let count = self.metadata.increment_row_count(self.table_id, 1)?;
        self.cache.put_row_count(self.table_id, count);

        log::debug!(
            "inserted row {} into table {} ({} live rows)",
            row.uuid(),
            self.table_id,
            count
        );
        Ok(row.uuid())
    }

    /// Update a row in place: delete the stored version, insert the new one
    /// under the same UUID.
    pub fn update(&self, row: &Row) -> Result<()> {
        self.delete(row.uuid())?;
        self.insert(row)?;
        Ok(())
    }

    /// Delete a row by UUID, removing its data, index, and null-index keys.
    /// Returns the deleted row.
    pub fn delete(&self, uuid: Uuid) -> Result<Row> {
        let row = self.get(uuid)?;

        let mut ops = vec![WriteOp::Delete {
            key: RowKey::Data {
                table_id: self.table_id,
                uuid,
            }
            .encode(),
        }];
        self.append_index_ops(&row, None, &mut ops)?;
        self.store.write_batch(ops)?;

        let count = self.metadata.increment_row_count(self.table_id, -1)?;
        self.cache.put_row_count(self.table_id, count);
        Ok(row)
    }

    /// Fetch a row by UUID.
    pub fn get(&self, uuid: Uuid) -> Result<Row> {
        let key = RowKey::Data {
            table_id: self.table_id,
            uuid,
        }
        .encode();
        match self.store.get(&key)? {
            Some(value) => Row::deserialize(&value),
            None => Err(EngineError::RowNotFound(uuid)),
        }
    }

    /// Delete every row of the table, batching deletes to bound memory.
    /// Resets the row count. Returns the number of rows removed.
    pub fn delete_all_rows(&self) -> Result<u64> {
        let range = scan::table_scan_range(self.table_id);
        let iter = self.store.scan(&range.start, &range.end)?;

        let mut ops: Vec<WriteOp> = Vec::new();
        let mut deleted = 0u64;
        for (key, value) in iter {
            let row = Row::deserialize(&value)?;
            ops.push(WriteOp::Delete { key });
            self.append_index_ops(&row, None, &mut ops)?;
            deleted += 1;
            if ops.len() >= MAX_BATCH_OPS {
                self.store.write_batch(std::mem::take(&mut ops))?;
            }
        }
        if !ops.is_empty() {
            self.store.write_batch(ops)?;
        }

        self.metadata.truncate_row_count(self.table_id)?;
        self.cache.put_row_count(self.table_id, 0);

        log::info!("deleted all {} rows of table {}", deleted, self.table_id);
        Ok(deleted)
    }

    /// Cursor over every row of the table in data-key (UUID) order.
    pub fn table_scan(&self) -> Result<Cursor> {
        let range = scan::table_scan_range(self.table_id);
        let iter = self.store.scan(&range.start, &range.end)?;
        Ok(Cursor::new(iter, None))
    }

    /// Cursor over the rows selected by an index query, in the query's
    /// requested order.
    pub fn index_scan(&self, query: &QueryKey) -> Result<Cursor> {
        let index_ids = self.cache.index_ids(self.table_id)?;
        let index_id = *index_ids.get(query.index_name()).ok_or_else(|| {
            EngineError::invalid_argument(format!("unknown index: {}", query.index_name()))
        })?;

        let plan = scan::index_scan_range(self.table_id, index_id, &self.schema, query)?;
        let iter = self.store.scan(&plan.range.start, &plan.range.end)?;
        Ok(Cursor::new(iter, plan.skip_prefix))
    }

    /// UUIDs of every row holding SQL NULL in the given column, from the
    /// null-index family.
    pub fn scan_nulls(&self, column: &str) -> Result<Vec<Uuid>> {
        let columns = self.cache.column_ids(self.table_id)?;
        let column_id = columns.id(column).ok_or_else(|| {
            EngineError::invalid_argument(format!("unknown column: {}", column))
        })?;

        let range = scan::null_scan_range(self.table_id, column_id)?;
        let mut uuids = Vec::new();
        for (key, _) in self.store.scan(&range.start, &range.end)? {
            let suffix: [u8; 16] = key[key.len() - 16..]
                .try_into()
                .map_err(|_| EngineError::encoding("malformed null-index key"))?;
            uuids.push(Uuid::from_bytes(suffix));
        }
        Ok(uuids)
    }

    fn with_auto_increment(&self, row: &Row) -> Result<Row> {
        if let Some(column) = self.schema.auto_increment_column() {
            if row.get(&column.name).is_none() {
                let next = self.metadata.increment_auto_increment(self.table_id, 1)?;
                self.cache.put_auto_increment(self.table_id, next);
                let mut filled = row.clone();
                filled.set(column.name.clone(), next.to_be_bytes().to_vec());
                return Ok(filled);
            }
        }
        Ok(row.clone())
    }

    /// Append the index-key operations for one row. `Some(serialized)`
    /// produces puts (insert path), `None` produces deletes (delete path);
    /// both derive identical keys from the row.
    fn append_index_ops(
        &self,
        row: &Row,
        serialized: Option<&[u8]>,
        ops: &mut Vec<WriteOp>,
    ) -> Result<()> {
        let index_ids = self.cache.index_ids(self.table_id)?;
        for index in self.schema.indices() {
            let index_id = *index_ids.get(&index.name).ok_or_else(|| {
                EngineError::invalid_argument(format!(
                    "index {} has no registered id",
                    index.name
                ))
            })?;
            let (ascending, descending) = scan::index_keys_for_row(
                self.table_id,
                index_id,
                &self.schema,
                &index.name,
                row,
            )?;
            for key in [ascending.encode(), descending.encode()] {
                ops.push(match serialized {
                    Some(value) => WriteOp::Put {
                        key,
                        value: value.to_vec(),
                    },
                    None => WriteOp::Delete { key },
                });
            }
        }

        let columns = self.cache.column_ids(self.table_id)?;
        for column_name in self.null_index_columns(row) {
            let column_id = columns.id(&column_name).ok_or_else(|| {
                EngineError::invalid_argument(format!(
                    "column {} has no registered id",
                    column_name
                ))
            })?;
            let key = RowKey::NullIndex {
                table_id: self.table_id,
                column_id,
                uuid: row.uuid(),
            }
            .encode();
            ops.push(match serialized {
                Some(_) => WriteOp::Put {
                    key,
                    value: Vec::new(),
                },
                None => WriteOp::Delete { key },
            });
        }
        Ok(())
    }

    /// Indexed columns this row holds NULL in, deduplicated across indices.
    fn null_index_columns(&self, row: &Row) -> BTreeSet<String> {
        self.schema
            .indices()
            .iter()
            .flat_map(|index| index.columns.iter())
            .filter(|column| row.get(column).is_none())
            .cloned()
            .collect()
    }
}

/// A forward-only cursor over one scan range.
///
/// The cursor owns the store's iterator; dropping or closing it releases
/// the underlying scanner on every exit path, including scan abort. An
/// exhausted cursor yields `Ok(None)`; running out of rows is not an
/// error.
pub struct Cursor {
    iter: KvIterator,
    skip_prefix: Option<Vec<u8>>,
}

impl Cursor {
    fn new(iter: KvIterator, skip_prefix: Option<Vec<u8>>) -> Self {
        Self { iter, skip_prefix }
    }

    /// The next row, or `Ok(None)` once the range is exhausted.
    ///
    /// For after/before queries the planner includes the boundary rows in
    /// the range; this is where they are filtered out.
    pub fn next(&mut self) -> Result<Option<Row>> {
        for (key, value) in self.iter.by_ref() {
            if let Some(prefix) = &self.skip_prefix {
                if key.starts_with(prefix) {
                    continue;
                }
            }
            return Row::deserialize(&value).map(Some);
        }
        Ok(None)
    }

    /// Release the cursor and its backing scanner.
    pub fn close(self) {}
}
