use indexmap::IndexMap;

use super::error::StorageError;

/// Raw key/value storage scoped to a single contract instance
pub trait ContractStorage {
    fn load_data(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    fn has_data(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.load_data(key)?.is_some())
    }

    fn store_data(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StorageError>;
}

/// In-memory contract storage, keys kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: IndexMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(Vec::as_slice)
    }
}

impl ContractStorage for MemoryStorage {
    fn load_data(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn has_data(&self, key: &[u8]) -> Result<bool, StorageError> {
        Ok(self.entries.contains_key(key))
    }

    fn store_data(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StorageError> {
        self.entries.insert(key.to_vec(), value);
        Ok(())
    }
}

/// Write overlay over a committed storage for the duration of one call.
///
/// Reads check the overlay first, then the committed storage.
/// Writes only land in the overlay; the host merges them
/// with [`ContractCache::into_writes`] when the call succeeded,
/// otherwise they are dropped with the cache.
pub struct ContractCache<'a, S: ContractStorage> {
    committed: &'a S,
    writes: IndexMap<Vec<u8>, Vec<u8>>,
}

impl<'a, S: ContractStorage> ContractCache<'a, S> {
    pub fn new(committed: &'a S) -> Self {
        Self {
            committed,
            writes: IndexMap::new(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.writes.is_empty()
    }

    pub fn into_writes(self) -> IndexMap<Vec<u8>, Vec<u8>> {
        self.writes
    }
}

impl<'a, S: ContractStorage> ContractStorage for ContractCache<'a, S> {
    fn load_data(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(value) = self.writes.get(key) {
            return Ok(Some(value.clone()));
        }
        self.committed.load_data(key)
    }

    fn store_data(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StorageError> {
        self.writes.insert(key.to_vec(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_reads_through_to_committed() {
        let mut committed = MemoryStorage::new();
        committed.store_data(b"a", b"1".to_vec()).unwrap();

        let mut cache = ContractCache::new(&committed);
        assert_eq!(cache.load_data(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(!cache.is_dirty());

        cache.store_data(b"a", b"2".to_vec()).unwrap();
        cache.store_data(b"b", b"3".to_vec()).unwrap();
        assert_eq!(cache.load_data(b"a").unwrap(), Some(b"2".to_vec()));
        assert!(cache.has_data(b"b").unwrap());

        let writes = cache.into_writes();
        assert_eq!(writes.len(), 2);
        // committed storage untouched until merged
        assert_eq!(committed.load_data(b"a").unwrap(), Some(b"1".to_vec()));
        assert!(!committed.has_data(b"b").unwrap());
    }

    #[test]
    fn test_memory_storage_keeps_insertion_order() {
        let mut storage = MemoryStorage::new();
        storage.store_data(b"z", vec![]).unwrap();
        storage.store_data(b"a", vec![]).unwrap();
        storage.store_data(b"z", vec![1]).unwrap();

        let keys: Vec<&[u8]> = storage.keys().collect();
        assert_eq!(keys, vec![b"z".as_slice(), b"a".as_slice()]);
        assert_eq!(storage.len(), 2);
    }
}
