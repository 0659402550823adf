//! The engine context object.
//!
//! One `Engine` is constructed at startup around a store handle and passed
//! by reference into every operation; there is no ambient global state.
//! It owns the metadata store and cache and hands out [`Table`] handles.

use std::sync::Arc;

use strata_commons::{Result, Row, TableId, TableSchema};
use strata_store::OrderedStore;
use uuid::Uuid;

use crate::metadata::{MetadataCache, MetadataStore};
use crate::table::Table;

/// Top-level adapter surface consumed by the relational layer.
pub struct Engine {
    store: Arc<dyn OrderedStore>,
    metadata: Arc<MetadataStore>,
    cache: Arc<MetadataCache>,
}

impl Engine {
    /// Build an engine over an ordered store handle.
    pub fn new(store: Arc<dyn OrderedStore>) -> Self {
        let metadata = Arc::new(MetadataStore::new(Arc::clone(&store)));
        let cache = Arc::new(MetadataCache::new(Arc::clone(&metadata)));
        Self {
            store,
            metadata,
            cache,
        }
    }

    /// Create a table and return its stable id.
    pub fn create_table(&self, name: &str, schema: &TableSchema) -> Result<TableId> {
        self.metadata.create_table(name, schema)
    }

    /// Open a table by name, resolving its id and schema through the cache.
    pub fn open_table(&self, name: &str) -> Result<Table> {
        let table_id = self.cache.table_id(name)?;
        let schema = self.cache.schema(table_id)?;
        Ok(Table::new(
            Arc::clone(&self.store),
            Arc::clone(&self.metadata),
            Arc::clone(&self.cache),
            table_id,
            schema,
        ))
    }

    /// Drop a table: delete all row and index data, then all metadata, then
    /// invalidate every cached entry for it.
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let table = self.open_table(name)?;
        table.delete_all_rows()?;

        let table_id = self.metadata.drop_table(name)?;
        self.cache.invalidate_table(name, table_id);
        self.cache.invalidate_indices(table_id);
        self.cache.invalidate_row_count(table_id);
        self.cache.invalidate_auto_increment(table_id);
        Ok(())
    }

    /// Rename a table. Ids are stable, so only the name mapping moves.
    pub fn rename_table(&self, old_name: &str, new_name: &str) -> Result<()> {
        let table_id = self.cache.table_id(old_name)?;
        self.metadata.rename_table(old_name, new_name)?;
        self.cache.invalidate_table(old_name, table_id);
        Ok(())
    }

    /// Replace a table's schema (alter path) and invalidate its cached
    /// metadata atomically.
    pub fn alter_table(&self, name: &str, schema: &TableSchema) -> Result<()> {
        let table_id = self.cache.table_id(name)?;
        self.metadata.replace_schema(table_id, schema)?;
        self.cache.invalidate_table(name, table_id);
        self.cache.invalidate_indices(table_id);
        Ok(())
    }

    /// Current row count of a table.
    pub fn row_count(&self, name: &str) -> Result<i64> {
        let table_id = self.cache.table_id(name)?;
        self.cache.row_count(table_id)
    }

    /// Adjust a table's row count; the backing counter is authoritative and
    /// the cache mirrors the returned value.
    pub fn increment_row_count(&self, name: &str, amount: i64) -> Result<i64> {
        let table_id = self.cache.table_id(name)?;
        let count = self.metadata.increment_row_count(table_id, amount)?;
        self.cache.put_row_count(table_id, count);
        Ok(count)
    }

    /// Reset a table's row count to zero.
    pub fn truncate_row_count(&self, name: &str) -> Result<()> {
        let table_id = self.cache.table_id(name)?;
        self.metadata.truncate_row_count(table_id)?;
        self.cache.put_row_count(table_id, 0);
        Ok(())
    }

    /// Current auto-increment value of a table.
    pub fn auto_increment(&self, name: &str) -> Result<i64> {
        let table_id = self.cache.table_id(name)?;
        self.cache.auto_increment(table_id)
    }

    /// Advance a table's auto-increment counter and return the new value.
    pub fn increment_auto_increment(&self, name: &str, amount: i64) -> Result<i64> {
        let table_id = self.cache.table_id(name)?;
        let value = self.metadata.increment_auto_increment(table_id, amount)?;
        self.cache.put_auto_increment(table_id, value);
        Ok(value)
    }

    /// Reset a table's auto-increment counter.
    pub fn truncate_auto_increment(&self, name: &str) -> Result<()> {
        let table_id = self.cache.table_id(name)?;
        self.metadata.truncate_auto_increment(table_id)?;
        self.cache.put_auto_increment(table_id, 0);
        Ok(())
    }

    /// Convenience insert by table name.
    pub fn insert(&self, name: &str, row: &Row) -> Result<Uuid> {
        self.open_table(name)?.insert(row)
    }

    /// Convenience point lookup by table name.
    pub fn get(&self, name: &str, uuid: Uuid) -> Result<Row> {
        self.open_table(name)?.get(uuid)
    }
}
