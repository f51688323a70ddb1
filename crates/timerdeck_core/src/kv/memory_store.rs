//! In-process key-value store.

use super::{check_quota, KeyValueStore, StorageResult};
use std::collections::HashMap;

/// Volatile `KeyValueStore` kept in a `HashMap`.
///
/// Used for sessions without device storage and as a test backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    items: HashMap<String, String>,
    max_value_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects values larger than `limit` bytes with `QuotaExceeded`.
    pub fn with_max_value_bytes(mut self, limit: usize) -> Self {
        self.max_value_bytes = Some(limit);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> StorageResult<()> {
        check_quota(key, value, self.max_value_bytes)?;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> StorageResult<()> {
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKeyValueStore;
    use crate::kv::{KeyValueStore, StorageError};

    #[test]
    fn missing_key_reads_as_none() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get_item("timerData").unwrap(), None);
    }

    #[test]
    fn set_item_overwrites() {
        let mut store = MemoryKeyValueStore::new();
        store.set_item("k", "one").unwrap();
        store.set_item("k", "two").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("two"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn quota_rejection_keeps_previous_value() {
        let mut store = MemoryKeyValueStore::new().with_max_value_bytes(4);
        store.set_item("k", "abc").unwrap();

        let err = store.set_item("k", "abcdef").unwrap_err();
        assert_eq!(
            err,
            StorageError::QuotaExceeded {
                key: "k".to_string(),
                attempted_bytes: 6,
                limit_bytes: Some(4),
            }
        );
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("abc"));
    }
}
