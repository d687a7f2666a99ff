//! Document persistence: a narrow key-value capability and its backends.
//!
//! The collection only ever needs point get/insert/remove over string keys
//! and values, so that is the whole trait. `DocStore` binds it to a Fjall
//! database on disk; `MemoryStore` backs tests and throwaway collections.

use std::collections::HashMap;
use std::path::Path;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};

use crate::error::SepiaError;
use crate::Result;

/// Key-value capability consumed by the collection
pub trait Store {
    /// Fetch the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite the value under `key`
    fn insert(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove the value under `key`; removing an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;
}

const DOCS_CF: &str = "docs";

/// Fjall-backed document store bound to a state directory
pub struct DocStore {
    docs: Keyspace,
    _db: Database,
}

impl DocStore {
    /// Open (or create) the store under `state_dir`
    pub fn open(state_dir: impl AsRef<Path>) -> Result<Self> {
        let state_dir = state_dir.as_ref();
        std::fs::create_dir_all(state_dir)
            .map_err(|e| SepiaError::Store(format!("failed to create state dir: {}", e)))?;

        let db = Database::builder(state_dir)
            .open()
            .map_err(|e| SepiaError::Store(format!("failed to open fjall store: {}", e)))?;

        let docs = db
            .keyspace(DOCS_CF, || KeyspaceCreateOptions::default())
            .map_err(|e| SepiaError::Store(format!("failed to open docs keyspace: {}", e)))?;

        Ok(Self { docs, _db: db })
    }
}

impl Store for DocStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(value) = self
            .docs
            .get(key)
            .map_err(|e| SepiaError::Store(e.to_string()))?
        else {
            return Ok(None);
        };
        let text = String::from_utf8(value.as_ref().to_vec())
            .map_err(|e| SepiaError::Store(format!("non-utf8 value under {:?}: {}", key, e)))?;
        Ok(Some(text))
    }

    fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        self.docs
            .insert(key, value)
            .map_err(|e| SepiaError::Store(e.to_string()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.docs
            .remove(key)
            .map_err(|e| SepiaError::Store(e.to_string()))
    }
}

/// In-memory store for tests and ephemeral collections
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn insert(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
