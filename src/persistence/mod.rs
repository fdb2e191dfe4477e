//! Key-value persistence collaborator
//!
//! The game treats storage as a synchronous string store. Every record is a
//! JSON document under its own `blockfit_*` key. Storage failures never reach
//! gameplay: loads fall back to defaults, saves report `false`.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(target_arch = "wasm32")]
mod local;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

/// Synchronous key-value store
pub trait Storage {
    /// Raw value for a key, if present and readable
    fn get(&self, key: &str) -> Option<String>;
    /// Store a raw value; false when the store rejected the write
    fn set(&mut self, key: &str, value: &str) -> bool;
    /// Delete a key (missing keys are fine)
    fn remove(&mut self, key: &str);
}

/// Load a record, falling back to its default when missing or corrupt.
///
/// Records derive `#[serde(default)]`, so stored documents missing newer
/// fields merge with the defaults instead of failing.
pub fn load<T: DeserializeOwned + Default>(store: &dyn Storage, key: &str) -> T {
    load_opt(store, key).unwrap_or_default()
}

/// Load a record if one is stored and parses
pub fn load_opt<T: DeserializeOwned>(store: &dyn Storage, key: &str) -> Option<T> {
    let json = store.get(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding unreadable record {}: {}", key, e);
            None
        }
    }
}

/// Save a record; false (and a warning) when serialization or the write fails
pub fn save<T: Serialize>(store: &mut dyn Storage, key: &str, value: &T) -> bool {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Could not serialize {}: {}", key, e);
            return false;
        }
    };
    let ok = store.set(key, &json);
    if !ok {
        log::warn!("Storage rejected write to {}", key);
    }
    ok
}

/// In-memory store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    /// Reject every write, as a full or unavailable store would
    read_only: bool,
    writes: u64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes all fail
    pub fn unavailable() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Successful writes so far
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        if self.read_only {
            return false;
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        true
    }

    fn remove(&mut self, key: &str) {
        if !self.read_only {
            self.entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Record {
        a: u32,
        b: String,
    }

    #[test]
    fn test_missing_key_yields_default() {
        let store = MemoryStorage::new();
        let r: Record = load(&store, "nope");
        assert_eq!(r, Record::default());
    }

    #[test]
    fn test_partial_document_merges_defaults() {
        let mut store = MemoryStorage::new();
        store.set("rec", r#"{"a": 7}"#);
        let r: Record = load(&store, "rec");
        assert_eq!(r.a, 7);
        assert_eq!(r.b, "");
    }

    #[test]
    fn test_corrupt_document_yields_default() {
        let mut store = MemoryStorage::new();
        store.set("rec", "{not json");
        let r: Record = load(&store, "rec");
        assert_eq!(r, Record::default());
    }

    #[test]
    fn test_unavailable_store_reports_failure() {
        let mut store = MemoryStorage::unavailable();
        assert!(!save(&mut store, "rec", &Record { a: 1, b: "x".into() }));
        let r: Record = load(&store, "rec");
        assert_eq!(r, Record::default());
        assert_eq!(store.write_count(), 0);
    }
}
