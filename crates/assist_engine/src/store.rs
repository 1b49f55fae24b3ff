use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use assist_core::StorageKey;
use assist_logging::{assist_debug, assist_info};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::persist::{write_atomically, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to persist store: {0}")]
    Persist(#[from] PersistError),
    #[error("failed to read store file {path}: {message}")]
    Read { path: String, message: String },
    #[error("store file {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },
    #[error("failed to encode store: {0}")]
    Encode(String),
    #[error("stored {key} has an unexpected shape: {message}")]
    Decode { key: StorageKey, message: String },
}

/// The extension's persisted key-value store, shared by every tab of a profile.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: StorageKey) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: StorageKey, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: StorageKey) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Typed read of `key`.
pub async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: StorageKey,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|err| StoreError::Decode {
                key,
                message: err.to_string(),
            }),
    }
}

/// Typed write of `key`.
pub async fn save<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: StorageKey,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|err| StoreError::Encode(err.to_string()))?;
    store.set(key, value).await
}

/// In-process store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<StorageKey, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedStore {
    entries: BTreeMap<String, Value>,
}

/// Store backed by a RON file, rewritten atomically on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStore {
    /// Open `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = read_entries(&path)?;
        assist_info!("Opened store {:?} with {} key(s)", path, entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, Value>),
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        change(&mut next);

        let persisted = PersistedStore {
            entries: next.clone(),
        };
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&persisted, pretty)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        write_atomically(&self.path, &content)?;

        // Memory only moves forward once the file write succeeded.
        *entries = next;
        assist_debug!("Persisted store {:?}", self.path);
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: StorageKey) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key.as_str()).cloned())
    }

    async fn set(&self, key: StorageKey, value: Value) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.as_str().to_string(), value);
        })
    }

    async fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key.as_str());
        })
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.update(BTreeMap::clear)
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, Value>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => {
            return Err(StoreError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            })
        }
    };
    let persisted: PersistedStore = ron::from_str(&content).map_err(|err| StoreError::Corrupt {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(persisted.entries)
}
