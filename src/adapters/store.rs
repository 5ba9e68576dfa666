use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use toml::{Table, Value};

use super::KeyValueStore;
use crate::error::SyncError;

/// TOML-backed store: one table per namespace, integer values.
///
/// The file is re-read on every `get` and rewritten on every `put`.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_table(&self) -> Result<Table, SyncError> {
        if !self.path.exists() {
            return Ok(Table::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| unavailable(&self.path, e))?;
        toml::from_str::<Table>(&content).map_err(|e| unavailable(&self.path, e))
    }
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> SyncError {
    SyncError::PersistenceUnavailable(format!("{}: {}", path.display(), err))
}

impl KeyValueStore for FileStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<i64>, SyncError> {
        let root = self.read_table()?;
        Ok(root
            .get(namespace)
            .and_then(Value::as_table)
            .and_then(|ns| ns.get(key))
            .and_then(Value::as_integer))
    }

    fn put(&self, namespace: &str, key: &str, value: i64) -> Result<(), SyncError> {
        let mut root = self.read_table()?;
        let entry = root
            .entry(namespace.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        match entry {
            Value::Table(ns) => {
                ns.insert(key.to_string(), Value::Integer(value));
            }
            other => {
                let mut ns = Table::new();
                ns.insert(key.to_string(), Value::Integer(value));
                *other = Value::Table(ns);
            }
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| unavailable(&self.path, e))?;
        }
        let serialized = toml::to_string_pretty(&root).map_err(|e| unavailable(&self.path, e))?;
        fs::write(&self.path, serialized).map_err(|e| unavailable(&self.path, e))
    }
}

/// Volatile store for tests and hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<(String, String), i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<i64>, SyncError> {
        let values = self
            .values
            .lock()
            .map_err(|_| SyncError::PersistenceUnavailable("memory store poisoned".into()))?;
        Ok(values
            .get(&(namespace.to_string(), key.to_string()))
            .copied())
    }

    fn put(&self, namespace: &str, key: &str, value: i64) -> Result<(), SyncError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| SyncError::PersistenceUnavailable("memory store poisoned".into()))?;
        values.insert((namespace.to_string(), key.to_string()), value);
        Ok(())
    }
}
