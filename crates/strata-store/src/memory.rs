//! In-memory implementation of [`OrderedStore`].
//!
//! A `BTreeMap` under a read-write lock gives the same byte-lexicographic
//! ordering guarantees as a real sorted store. Used by the engine's test
//! suites and by embedders that want a process-local adapter.
//!
//! Counters live beside regular keys as 8-byte big-endian values, so a
//! counter can be read with `get` and reset with `delete` like any other key;
//! only `increment` mutates one atomically (under the write lock).

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::store_trait::{KvIterator, OrderedStore, Result, StoreError, WriteOp};

/// BTreeMap-backed ordered store.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored. Test helper.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn write_batch(&self, ops: Vec<WriteOp>) -> Result<()> {
        let mut data = self.data.write();
        for op in ops {
            match op {
                WriteOp::Put { key, value } => {
                    data.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn scan(&self, start: &[u8], end: &[u8]) -> Result<KvIterator> {
        if start > end {
            return Err(StoreError::Other(format!(
                "scan start {:02x?} is past end {:02x?}",
                start, end
            )));
        }
        // Materialize the range so the iterator owns its data and outlives
        // the lock, mirroring a snapshot-backed scanner.
        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = self
            .data
            .read()
            .range::<[u8], _>((Bound::Included(start), Bound::Excluded(end)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(snapshot.into_iter()))
    }

    fn increment(&self, counter_key: &[u8], amount: i64) -> Result<i64> {
        let mut data = self.data.write();
        let current = match data.get(counter_key) {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Other(format!(
                        "counter at {:02x?} holds a non-counter value",
                        counter_key
                    ))
                })?;
                i64::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = current + amount;
        data.insert(counter_key.to_vec(), next.to_be_bytes().to_vec());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put(b"k1", b"v1").unwrap();
        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));

        store.delete(b"k1").unwrap();
        assert_eq!(store.get(b"k1").unwrap(), None);

        // Deleting a missing key is fine.
        store.delete(b"k1").unwrap();
    }

    #[test]
    fn test_scan_is_ordered_and_half_open() {
        let store = MemoryStore::new();
        for key in [&b"b"[..], b"a", b"d", b"c"] {
            store.put(key, b"x").unwrap();
        }

        let keys: Vec<Vec<u8>> = store
            .scan(b"a", b"d")
            .unwrap()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_scan_snapshot_survives_writes() {
        let store = MemoryStore::new();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();

        let mut iter = store.scan(b"a", b"z").unwrap();
        store.delete(b"b").unwrap();

        assert_eq!(iter.next().map(|(k, _)| k), Some(b"a".to_vec()));
        assert_eq!(iter.next().map(|(k, _)| k), Some(b"b".to_vec()));
    }

    #[test]
    fn test_write_batch_applies_all_ops() {
        let store = MemoryStore::new();
        store.put(b"gone", b"x").unwrap();

        store
            .write_batch(vec![
                WriteOp::Put {
                    key: b"k1".to_vec(),
                    value: b"v1".to_vec(),
                },
                WriteOp::Put {
                    key: b"k2".to_vec(),
                    value: b"v2".to_vec(),
                },
                WriteOp::Delete {
                    key: b"gone".to_vec(),
                },
            ])
            .unwrap();

        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get(b"k2").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.get(b"gone").unwrap(), None);
    }

    #[test]
    fn test_increment_starts_at_zero_and_reads_with_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.increment(b"ctr", 0).unwrap(), 0);
        assert_eq!(store.increment(b"ctr", 5).unwrap(), 5);
        assert_eq!(store.increment(b"ctr", -2).unwrap(), 3);
        assert_eq!(store.increment(b"ctr", 0).unwrap(), 3);

        // Reset by deleting the counter key.
        store.delete(b"ctr").unwrap();
        assert_eq!(store.increment(b"ctr", 0).unwrap(), 0);
    }

    #[test]
    fn test_concurrent_increments_do_not_lose_updates() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryStore::new());
        let mut handles = vec![];
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    store.increment(b"ctr", 1).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.increment(b"ctr", 0).unwrap(), 800);
    }
}
