//! In-memory store backend.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use super::{Collection, DurableStore, StoreError, suffix_in_bounds};

/// Ordered maps per collection behind one `RwLock`.
///
/// Every primitive takes the lock once, so `put_unique` and
/// `compare_and_swap` are atomic per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<Collection, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get_by_key(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned { collection })?;
        Ok(guard.get(&collection).and_then(|c| c.get(key)).cloned())
    }

    fn put_unique(&self, collection: Collection, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut guard = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned { collection })?;
        let records = guard.entry(collection).or_default();
        if records.contains_key(key) {
            return Err(StoreError::DuplicateKey {
                collection,
                key: key.to_string(),
            });
        }
        records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn compare_and_swap(
        &self,
        collection: Collection,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> Result<(), StoreError> {
        let mut guard = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned { collection })?;
        let records = guard.entry(collection).or_default();
        if records.get(key).map(Vec::as_slice) != expected {
            return Err(StoreError::Conflict {
                collection,
                key: key.to_string(),
            });
        }
        records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn query_range(
        &self,
        collection: Collection,
        prefix: &str,
        lower: Bound<&str>,
        upper: Bound<&str>,
    ) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned { collection })?;
        let Some(records) = guard.get(&collection) else {
            return Ok(Vec::new());
        };
        let start = prefix.to_string();
        Ok(records
            .range(start..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| suffix_in_bounds(&key[prefix.len()..], lower, upper))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned { collection })?;
        Ok(guard.get(&collection).map_or(0, BTreeMap::len))
    }
}
