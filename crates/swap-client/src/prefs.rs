//! Persisted user preferences
//!
//! A flat string key/value store. Reads of malformed data are the caller's
//! problem to default; the stores themselves only fail on I/O.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use swap_core::ClientError;
use tokio::sync::RwLock;

use crate::Result;

/// Key/value preference storage
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local preference store
#[derive(Default)]
pub struct MemoryPreferences {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preference store backed by a single JSON object on disk.
///
/// The whole file is rewritten on every `set`.
pub struct JsonFilePreferences {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl JsonFilePreferences {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file starts empty; an unreadable or malformed file is logged
    /// and also starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        "Ignoring malformed preferences file {}: {}",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read preferences file {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStore for JsonFilePreferences {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());

        let json = serde_json::to_string_pretty(&*entries)
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| ClientError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}
