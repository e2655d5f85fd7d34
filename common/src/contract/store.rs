use std::collections::BTreeMap;

use log::trace;

use super::{
    error::ScriptLogError,
    storage::ContractStorage,
};
use crate::config::{script_key, SCRIPT_ID_KEY};

/// Typed persistent state of the script log
pub trait ScriptStore {
    fn counter(&self) -> Result<Option<u64>, ScriptLogError>;

    fn set_counter(&mut self, value: u64) -> Result<(), ScriptLogError>;

    fn entry(&self, index: u64) -> Result<Option<String>, ScriptLogError>;

    fn put_entry(&mut self, index: u64, value: String) -> Result<(), ScriptLogError>;
}

/// Script store held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryScriptStore {
    counter: Option<u64>,
    entries: BTreeMap<u64, String>,
}

impl MemoryScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &BTreeMap<u64, String> {
        &self.entries
    }
}

impl ScriptStore for MemoryScriptStore {
    fn counter(&self) -> Result<Option<u64>, ScriptLogError> {
        Ok(self.counter)
    }

    fn set_counter(&mut self, value: u64) -> Result<(), ScriptLogError> {
        self.counter = Some(value);
        Ok(())
    }

    fn entry(&self, index: u64) -> Result<Option<String>, ScriptLogError> {
        Ok(self.entries.get(&index).cloned())
    }

    fn put_entry(&mut self, index: u64, value: String) -> Result<(), ScriptLogError> {
        self.entries.insert(index, value);
        Ok(())
    }
}

/// Script store laid out on raw contract storage.
///
/// The counter lives under `script_id` as a decimal string and
/// each script under `scripts_{index}`, both UTF-8 encoded.
pub struct KeyedScriptStore<'a, S: ContractStorage> {
    storage: &'a mut S,
}

impl<'a, S: ContractStorage> KeyedScriptStore<'a, S> {
    pub fn new(storage: &'a mut S) -> Self {
        Self { storage }
    }
}

impl<'a, S: ContractStorage> ScriptStore for KeyedScriptStore<'a, S> {
    fn counter(&self) -> Result<Option<u64>, ScriptLogError> {
        let Some(bytes) = self.storage.load_data(SCRIPT_ID_KEY.as_bytes())? else {
            return Ok(None);
        };

        let value = String::from_utf8_lossy(&bytes);
        value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ScriptLogError::CorruptedCounter(value.into_owned()))
    }

    fn set_counter(&mut self, value: u64) -> Result<(), ScriptLogError> {
        trace!("set counter to {}", value);
        self.storage
            .store_data(SCRIPT_ID_KEY.as_bytes(), value.to_string().into_bytes())?;
        Ok(())
    }

    fn entry(&self, index: u64) -> Result<Option<String>, ScriptLogError> {
        match self.storage.load_data(script_key(index).as_bytes())? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| ScriptLogError::CorruptedEntry(index)),
            None => Ok(None),
        }
    }

    fn put_entry(&mut self, index: u64, value: String) -> Result<(), ScriptLogError> {
        trace!("put entry {}", index);
        self.storage
            .store_data(script_key(index).as_bytes(), value.into_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::storage::MemoryStorage;

    #[test]
    fn test_keyed_store_layout() {
        let mut storage = MemoryStorage::new();
        {
            let mut store = KeyedScriptStore::new(&mut storage);
            store.set_counter(2).unwrap();
            store.put_entry(0, "first".to_owned()).unwrap();
            store.put_entry(1, "second".to_owned()).unwrap();
        }

        assert_eq!(
            storage.load_data(b"script_id").unwrap(),
            Some(b"2".to_vec())
        );
        assert_eq!(
            storage.load_data(b"scripts_1").unwrap(),
            Some(b"second".to_vec())
        );
        assert_eq!(storage.len(), 3);
    }

    #[test]
    fn test_keyed_store_corrupted_counter() {
        let mut storage = MemoryStorage::new();
        storage
            .store_data(b"script_id", b"not a number".to_vec())
            .unwrap();

        let store = KeyedScriptStore::new(&mut storage);
        assert_eq!(
            store.counter(),
            Err(ScriptLogError::CorruptedCounter("not a number".to_owned()))
        );
    }

    #[test]
    fn test_keyed_store_missing_values() {
        let mut storage = MemoryStorage::new();
        let store = KeyedScriptStore::new(&mut storage);
        assert_eq!(store.counter(), Ok(None));
        assert_eq!(store.entry(7), Ok(None));
    }
}
