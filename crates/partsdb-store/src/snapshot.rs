//! Persistence of the last good [`PartStore`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use partsdb_core::PartStore;

use crate::StoreError;

/// A snapshot read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    pub store: PartStore,
    pub saved_at: DateTime<Utc>,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Replaces the stored snapshot wholesale.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptySnapshot`] for a store without records, or an I/O
    /// or serialization error.
    async fn save(&self, store: &PartStore) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] when nothing has been saved yet.
    async fn load(&self) -> Result<LoadedSnapshot, StoreError>;
}

/// Pretty-printed JSON file in the wire shape of [`PartStore`].
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    async fn save(&self, store: &PartStore) -> Result<(), StoreError> {
        if store.is_empty() {
            return Err(StoreError::EmptySnapshot);
        }
        let json = serde_json::to_string_pretty(store).map_err(StoreError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| self.io_err(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_err(e))?;

        tracing::info!(
            path = %self.path.display(),
            parts = store.len(),
            "snapshot saved"
        );
        Ok(())
    }

    async fn load(&self) -> Result<LoadedSnapshot, StoreError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(self.io_err(e)),
        };
        let store: PartStore =
            serde_json::from_str(&text).map_err(|source| StoreError::Deserialize {
                path: self.path.clone(),
                source,
            })?;
        if store.is_empty() {
            return Err(StoreError::EmptySnapshot);
        }

        let saved_at = tokio::fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
            .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);

        tracing::debug!(path = %self.path.display(), parts = store.len(), "snapshot loaded");
        Ok(LoadedSnapshot { store, saved_at })
    }
}

/// In-memory snapshot store that counts writes.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<LoadedSnapshot>>,
    writes: AtomicUsize,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_snapshot(store: PartStore, saved_at: DateTime<Utc>) -> Self {
        Self {
            slot: Mutex::new(Some(LoadedSnapshot { store, saved_at })),
            writes: AtomicUsize::new(0),
        }
    }

    /// Successful `save` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn current(&self) -> Option<PartStore> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_ref()
            .map(|s| s.store.clone())
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, store: &PartStore) -> Result<(), StoreError> {
        if store.is_empty() {
            return Err(StoreError::EmptySnapshot);
        }
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(LoadedSnapshot {
            store: store.clone(),
            saved_at: Utc::now(),
        });
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<LoadedSnapshot, StoreError> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
            .ok_or_else(|| StoreError::NotFound {
                path: PathBuf::from("memory"),
            })
    }
}
