//! Key-value backends for preferences.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::PreferenceError;

/// Synchronous string key-value storage.
pub trait PreferenceStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;

    fn remove(&self, key: &str) -> Result<(), PreferenceError>;
}

/// Preferences kept as a flat JSON object in a single file.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl PreferenceStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read()?;
        values.insert(key.to_string(), value.to_string());
        self.write(&values)
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read()?;
        if values.remove(key).is_some() {
            self.write(&values)?;
        }
        Ok(())
    }
}

/// In-memory storage, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one value.
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .lock()
            .insert(key.to_string(), value.to_string());
        storage
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        self.lock().remove(key);
        Ok(())
    }
}
