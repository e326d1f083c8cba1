use super::KvStore;
use crate::errors::AppResult;
use serde_json::Value;
use std::collections::HashMap;

/// Volatile key-value store, used by tests and by `--test` runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    entries: HashMap<String, Value>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key with raw JSON, e.g. to simulate data written by an
    /// older release.
    pub fn with_entry(mut self, key: &str, value: Value) -> Self {
        self.entries.insert(key.to_string(), value);
        self
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> AppResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &Value) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
