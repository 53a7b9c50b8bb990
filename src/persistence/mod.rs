//! Durable key-value storage for the economy ledger
//!
//! Features:
//! - Integer and small-set values behind one [`KvStore`] trait
//! - In-memory backend for tests and throwaway sessions
//! - JSON file backend with atomic replace (tmp → save)

mod json_file;

pub use json_file::JsonFileStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A stored value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Int(i64),
    Set(Vec<u32>),
}

impl StoreValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StoreValue::Int(v) => Some(*v),
            StoreValue::Set(_) => None,
        }
    }

    pub fn as_set(&self) -> Option<&[u32]> {
        match self {
            StoreValue::Set(v) => Some(v),
            StoreValue::Int(_) => None,
        }
    }
}

/// Opaque durable storage; writes become durable on `flush`
pub trait KvStore: std::fmt::Debug {
    fn get(&self, key: &str) -> Option<StoreValue>;
    fn put(&mut self, key: &str, value: StoreValue);
    fn remove(&mut self, key: &str);
    fn flush(&mut self) -> Result<(), StoreError>;
}

/// Volatile store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, StoreValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoreValue> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: StoreValue) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
