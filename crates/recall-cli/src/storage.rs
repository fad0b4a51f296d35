//! File-backed key-value store
//!
//! Keeps every key in one JSON object at `<data_dir>/state.json`, rewritten
//! on each put.

use async_trait::async_trait;
use recall_agent::{KeyValueStore, StorageError};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

const STATE_FILE: &str = "state.json";

pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STATE_FILE),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole map; a missing file is empty, a malformed one is
    /// `InvalidData`
    async fn load_map(&self) -> io::Result<HashMap<String, String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e),
        };
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Move a malformed file aside so the next write starts fresh without
    /// destroying it
    async fn quarantine(&self) -> io::Result<()> {
        let backup = self.path.with_extension("json.corrupt");
        tokio::fs::rename(&self.path, &backup).await?;
        tracing::warn!(
            "Malformed {} moved to {}",
            self.path.display(),
            backup.display()
        );
        Ok(())
    }

    async fn save_map(&self, map: &HashMap<String, String>) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let content = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, content).await
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self
            .load_map()
            .await
            .map_err(|e| StorageError::read(key, e))?;
        Ok(map.remove(key))
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = match self.load_map().await {
            Ok(map) => map,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                self.quarantine()
                    .await
                    .map_err(|e| StorageError::write(key, e))?;
                HashMap::new()
            }
            // Rewriting from an empty map here would drop every other key.
            Err(e) => return Err(StorageError::write(key, e)),
        };
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
            .await
            .map_err(|e| StorageError::write(key, e))
    }
}
