//! Read-mostly memoizing cache over the metadata store.
//!
//! Five independent keyspaces: table-name→id, column ids, schema, index ids,
//! and the two per-table counters. Each keyspace is a concurrent map of
//! lazily-initialized cells; a miss loads through the cell, so concurrent
//! misses on the *same* key collapse into one load while misses on
//! different keys never contend.
//!
//! Name, column, and schema lookups run under a shared read lock; a schema
//! or name change takes the write lock and drops all three entries for the
//! table in one critical section, so no reader observes an old name paired
//! with a new schema.
//!
//! The counters are different: they are updated in place (`put`) after every
//! counter write instead of being invalidated, avoiding a reload round-trip
//! per increment. The backing counter in the store remains authoritative;
//! cache updates always carry the value the store returned.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use strata_commons::{IndexId, Result, TableId, TableSchema};

use super::store::{ColumnIdMap, MetadataStore};

/// Memoizing cache for table metadata.
pub struct MetadataCache {
    metadata: Arc<MetadataStore>,
    /// Guards the name/column/schema keyspaces against torn invalidation.
    lock: RwLock<()>,
    table_ids: DashMap<String, Arc<OnceCell<TableId>>>,
    schemas: DashMap<TableId, Arc<OnceCell<Arc<TableSchema>>>>,
    columns: DashMap<TableId, Arc<OnceCell<Arc<ColumnIdMap>>>>,
    indices: DashMap<TableId, Arc<OnceCell<Arc<HashMap<String, IndexId>>>>>,
    row_counts: DashMap<TableId, i64>,
    auto_incs: DashMap<TableId, i64>,
}

impl MetadataCache {
    pub fn new(metadata: Arc<MetadataStore>) -> Self {
        Self {
            metadata,
            lock: RwLock::new(()),
            table_ids: DashMap::new(),
            schemas: DashMap::new(),
            columns: DashMap::new(),
            indices: DashMap::new(),
            row_counts: DashMap::new(),
            auto_incs: DashMap::new(),
        }
    }

    /// Table id for a name, loading on miss.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        let _guard = self.lock.read();
        let cell = cell_for(&self.table_ids, &name.to_string());
        cell.get_or_try_init(|| self.metadata.table_id(name))
            .copied()
    }

    /// Schema for a table id, loading on miss.
    pub fn schema(&self, table_id: TableId) -> Result<Arc<TableSchema>> {
        let _guard = self.lock.read();
        let cell = cell_for(&self.schemas, &table_id);
        cell.get_or_try_init(|| self.metadata.schema(table_id).map(Arc::new))
            .cloned()
    }

    /// Column name ↔ id mapping for a table, loading on miss.
    pub fn column_ids(&self, table_id: TableId) -> Result<Arc<ColumnIdMap>> {
        let _guard = self.lock.read();
        let cell = cell_for(&self.columns, &table_id);
        cell.get_or_try_init(|| self.metadata.column_ids(table_id).map(Arc::new))
            .cloned()
    }

    /// Index name → id mapping for a table, loading on miss.
    pub fn index_ids(&self, table_id: TableId) -> Result<Arc<HashMap<String, IndexId>>> {
        let cell = cell_for(&self.indices, &table_id);
        cell.get_or_try_init(|| self.metadata.index_ids(table_id).map(Arc::new))
            .cloned()
    }

    /// Cached row count, loading from the backing counter on miss.
    pub fn row_count(&self, table_id: TableId) -> Result<i64> {
        if let Some(count) = self.row_counts.get(&table_id) {
            return Ok(*count);
        }
        let count = self.metadata.row_count(table_id)?;
        Ok(*self.row_counts.entry(table_id).or_insert(count))
    }

    /// Update the cached row count in place with a value the backing
    /// counter returned.
    pub fn put_row_count(&self, table_id: TableId, value: i64) {
        self.row_counts.insert(table_id, value);
    }

    /// Drop the cached row count.
    pub fn invalidate_row_count(&self, table_id: TableId) {
        self.row_counts.remove(&table_id);
    }

    /// Cached auto-increment value, loading from the backing counter on
    /// miss.
    pub fn auto_increment(&self, table_id: TableId) -> Result<i64> {
        if let Some(value) = self.auto_incs.get(&table_id) {
            return Ok(*value);
        }
        let value = self.metadata.auto_increment(table_id)?;
        Ok(*self.auto_incs.entry(table_id).or_insert(value))
    }

    /// Update the cached auto-increment value in place.
    pub fn put_auto_increment(&self, table_id: TableId, value: i64) {
        self.auto_incs.insert(table_id, value);
    }

    /// Drop the cached auto-increment value.
    pub fn invalidate_auto_increment(&self, table_id: TableId) {
        self.auto_incs.remove(&table_id);
    }

    /// Drop the index mapping for a table.
    pub fn invalidate_indices(&self, table_id: TableId) {
        self.indices.remove(&table_id);
    }

    /// Atomically drop a table's name, column, and schema entries. Taken on
    /// every create/alter/rename/drop so readers never see a mix of old and
    /// new metadata.
    pub fn invalidate_table(&self, name: &str, table_id: TableId) {
        let _guard = self.lock.write();
        self.table_ids.remove(name);
        self.columns.remove(&table_id);
        self.schemas.remove(&table_id);
        log::debug!("invalidated cached metadata for table {} (id {})", name, table_id);
    }
}

/// Fetch (or lazily create) the single-flight cell for a key. The cell, not
/// the map entry, synchronizes the load: the map shard lock is held only for
/// the clone.
fn cell_for<K, V>(map: &DashMap<K, Arc<OnceCell<V>>>, key: &K) -> Arc<OnceCell<V>>
where
    K: Eq + Hash + Clone,
{
    map.entry(key.clone()).or_default().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use strata_commons::{ColumnSchema, ColumnType, IndexSchema};
    use strata_store::{MemoryStore, OrderedStore, StoreError, WriteOp};

    fn schema() -> TableSchema {
        TableSchema::new(
            vec![ColumnSchema::new("id", ColumnType::Long)],
            vec![IndexSchema::new("by_id", vec!["id".into()], false)],
        )
        .unwrap()
    }

    fn cache_with_table() -> (MetadataCache, TableId) {
        let metadata = Arc::new(MetadataStore::new(Arc::new(MemoryStore::new())));
        let table_id = metadata.create_table("orders", &schema()).unwrap();
        (MetadataCache::new(metadata), table_id)
    }

    /// Store wrapper counting point reads, to observe cache hits.
    struct CountingStore {
        inner: MemoryStore,
        gets: AtomicUsize,
    }

    impl OrderedStore for CountingStore {
        fn get(&self, key: &[u8]) -> std::result::Result<Option<Vec<u8>>, StoreError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }
        fn put(&self, key: &[u8], value: &[u8]) -> std::result::Result<(), StoreError> {
            self.inner.put(key, value)
        }
        fn delete(&self, key: &[u8]) -> std::result::Result<(), StoreError> {
            self.inner.delete(key)
        }
        fn write_batch(&self, ops: Vec<WriteOp>) -> std::result::Result<(), StoreError> {
            self.inner.write_batch(ops)
        }
        fn scan(
            &self,
            start: &[u8],
            end: &[u8],
        ) -> std::result::Result<strata_store::KvIterator, StoreError> {
            self.inner.scan(start, end)
        }
        fn increment(&self, key: &[u8], amount: i64) -> std::result::Result<i64, StoreError> {
            self.inner.increment(key, amount)
        }
    }

    #[test]
    fn test_lookups_are_memoized() {
        let store = Arc::new(CountingStore {
            inner: MemoryStore::new(),
            gets: AtomicUsize::new(0),
        });
        let metadata = Arc::new(MetadataStore::new(store.clone() as Arc<dyn OrderedStore>));
        metadata.create_table("orders", &schema()).unwrap();
        let cache = MetadataCache::new(metadata);

        let first = cache.table_id("orders").unwrap();
        let gets_after_first = store.gets.load(Ordering::SeqCst);
        for _ in 0..10 {
            assert_eq!(cache.table_id("orders").unwrap(), first);
        }
        assert_eq!(store.gets.load(Ordering::SeqCst), gets_after_first);
    }

    #[test]
    fn test_miss_on_unknown_table_is_not_cached() {
        let (cache, _) = cache_with_table();
        assert!(cache.table_id("ghost").is_err());
        // A later create must be visible: the failed load left no entry.
        assert!(cache.table_id("ghost").is_err());
    }

    #[test]
    fn test_invalidate_table_forces_reload() {
        let (cache, table_id) = cache_with_table();
        let before = cache.schema(table_id).unwrap();
        assert_eq!(before.columns().len(), 1);

        cache.invalidate_table("orders", table_id);
        // Reload still succeeds and yields a fresh Arc.
        let after = cache.schema(table_id).unwrap();
        assert_eq!(*before, *after);
    }

    #[test]
    fn test_counter_put_and_invalidate() {
        let (cache, table_id) = cache_with_table();
        assert_eq!(cache.row_count(table_id).unwrap(), 0);

        cache.put_row_count(table_id, 7);
        assert_eq!(cache.row_count(table_id).unwrap(), 7);

        cache.invalidate_row_count(table_id);
        // Falls back to the backing counter, which never saw the 7.
        assert_eq!(cache.row_count(table_id).unwrap(), 0);

        cache.put_auto_increment(table_id, 41);
        assert_eq!(cache.auto_increment(table_id).unwrap(), 41);
        cache.invalidate_auto_increment(table_id);
        assert_eq!(cache.auto_increment(table_id).unwrap(), 0);
    }

    #[test]
    fn test_index_ids_cached() {
        let (cache, table_id) = cache_with_table();
        let indices = cache.index_ids(table_id).unwrap();
        assert!(indices.contains_key("by_id"));
        // Second call returns the same shared map.
        let again = cache.index_ids(table_id).unwrap();
        assert!(Arc::ptr_eq(&indices, &again));
    }

    #[test]
    fn test_concurrent_readers_share_one_load() {
        let (cache, table_id) = cache_with_table();
        let cache = Arc::new(cache);

        let mut handles = vec![];
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || cache.schema(table_id).unwrap()));
        }
        let schemas: Vec<Arc<TableSchema>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        // Every thread got the same Arc: one load happened.
        for schema in &schemas[1..] {
            assert!(Arc::ptr_eq(&schemas[0], schema));
        }
    }
}
