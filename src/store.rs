//! Settings persistence
//!
//! The registry never persists anything itself; it talks to a
//! [`SettingsStore`] keyed by dotted paths such as `plugins.confreg.sitemaps`.

use crate::types::{RegistryError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

pub trait SettingsStore: Send + Sync {
    fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Store `value` at `path`; `description` is the audit message for the change
    fn set(&self, path: &str, value: Value, description: &str) -> Result<()>;

    fn remove(&self, path: &str) -> Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| RegistryError::Store("settings store lock poisoned".to_string()))
}

/// In-process store, keeps an audit trail of change descriptions
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, Value>>,
    changes: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change descriptions recorded by `set`, oldest first
    pub fn changes(&self) -> Vec<String> {
        self.changes.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values
            .lock()
            .map(|v| v.contains_key(path))
            .unwrap_or(false)
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(lock(&self.values)?.get(path).cloned())
    }

    fn set(&self, path: &str, value: Value, description: &str) -> Result<()> {
        lock(&self.values)?.insert(path.to_string(), value);
        lock(&self.changes)?.push(description.to_string());
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<()> {
        lock(&self.values)?.remove(path);
        Ok(())
    }
}

/// Store backed by a single JSON document on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if path.is_dir() {
            return Err(RegistryError::InvalidPath(path));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened settings store at {} ({} entries)", path.display(), values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Default location under the user's data directory
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("confreg").join("settings.json"))
            .ok_or_else(|| {
                RegistryError::ConfigError("Cannot determine data directory".to_string())
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &BTreeMap<String, Value>) -> Result<()> {
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, content)
            .map_err(|e| RegistryError::Store(format!("{}: {}", self.path.display(), e)))
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(lock(&self.values)?.get(path).cloned())
    }

    // Memory only changes once the file write succeeded
    fn set(&self, path: &str, value: Value, description: &str) -> Result<()> {
        let mut values = lock(&self.values)?;
        let mut updated = values.clone();
        updated.insert(path.to_string(), value);
        self.save(&updated)?;
        *values = updated;
        info!("{}", description);
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<()> {
        let mut values = lock(&self.values)?;
        if !values.contains_key(path) {
            return Ok(());
        }

        let mut updated = values.clone();
        updated.remove(path);
        self.save(&updated)?;
        *values = updated;
        debug!("Removed settings at {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_records_changes() {
        let store = MemoryStore::new();
        store
            .set("plugins.confreg.forms", json!({ "enabled": true }), "Added forms")
            .unwrap();

        assert_eq!(
            store.get("plugins.confreg.forms").unwrap(),
            Some(json!({ "enabled": true }))
        );
        assert_eq!(store.changes(), vec!["Added forms".to_string()]);

        store.remove("plugins.confreg.forms").unwrap();
        assert!(!store.contains("plugins.confreg.forms"));
    }

    #[test]
    fn test_json_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = JsonFileStore::open(&path).unwrap();
        store
            .set("plugins.confreg.reports", json!({ "enabled": false }), "Added reports")
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("plugins.confreg.reports").unwrap(),
            Some(json!({ "enabled": false }))
        );

        reopened.remove("plugins.confreg.reports").unwrap();
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("plugins.confreg.reports").unwrap(), None);
    }

    #[test]
    fn test_failed_write_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let parent = dir.path().join("nested");
        let store = JsonFileStore::open(parent.join("settings.json")).unwrap();
        store
            .set("plugins.confreg.forms", json!({ "enabled": false }), "Added forms")
            .unwrap();

        fs::remove_dir_all(&parent).unwrap();

        let result = store.set("plugins.confreg.email", json!({ "enabled": true }), "Added email");
        assert!(matches!(result, Err(RegistryError::Store(_))));
        assert_eq!(store.get("plugins.confreg.email").unwrap(), None);

        let result = store.remove("plugins.confreg.forms");
        assert!(matches!(result, Err(RegistryError::Store(_))));
        assert_eq!(
            store.get("plugins.confreg.forms").unwrap(),
            Some(json!({ "enabled": false }))
        );
    }

    #[test]
    fn test_json_file_store_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let result = JsonFileStore::open(dir.path());
        assert!(matches!(result, Err(RegistryError::InvalidPath(_))));
    }
}
