use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::fs;

use crate::{error::StorageError, models::PersistedSession};

// 1. SessionStorage Contract
/// SessionStorage
///
/// Abstract contract for persisting the auth session across restarts, keyed
/// by a store identifier. The real implementation writes JSON files; the mock
/// keeps everything in memory and can simulate failures.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Returns the persisted session for `store_id`, or `None` if nothing was saved.
    async fn load(&self, store_id: &str) -> Result<Option<PersistedSession>, StorageError>;

    async fn save(&self, store_id: &str, session: &PersistedSession) -> Result<(), StorageError>;

    /// Removes the persisted session. Removing a missing entry is not an error.
    async fn clear(&self, store_id: &str) -> Result<(), StorageError>;
}

// 2. The Real Implementation (JSON files)
/// FileSessionStorage
///
/// Stores each session as `<dir>/<store_id>.json`. Writes go through a
/// temporary file and a rename so a crash never leaves a half-written session.
/// On Unix the directory is `0700` and the file `0600`.
#[derive(Clone, Debug)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// path_for
    ///
    /// Resolves the file backing `store_id`. The identifier is sanitized first,
    /// so it can never escape `dir`.
    pub fn path_for(&self, store_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(store_id)))
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self, store_id: &str) -> Result<Option<PersistedSession>, StorageError> {
        let path = self.path_for(store_id);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };

        if raw.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn save(&self, store_id: &str, session: &PersistedSession) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) =
                fs::set_permissions(&self.dir, std::fs::Permissions::from_mode(0o700)).await
            {
                tracing::warn!("failed to chmod 0700 {}: {e}", self.dir.display());
            }
        }

        let path = self.path_for(store_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(session)?;

        fs::write(&tmp, json).await.map_err(|e| io_error(&tmp, e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| io_error(&tmp, e))?;
        }
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        Ok(())
    }

    async fn clear(&self, store_id: &str) -> Result<(), StorageError> {
        let path = self.path_for(store_id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// sanitize_key
///
/// Maps a store identifier onto a safe file stem: anything other than ASCII
/// alphanumerics, `-` and `_` becomes `_`, which rules out path separators and
/// `..` segments. An empty identifier maps to `session`.
pub fn sanitize_key(key: &str) -> String {
    let sanitized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "session".to_string()
    } else {
        sanitized
    }
}

// 3. The Mock Implementation (For Tests)
/// MemorySessionStorage
///
/// In-memory `SessionStorage` used in tests and whenever persistence is
/// disabled. With `should_fail` set, every operation returns
/// `StorageError::Simulated`.
#[derive(Default)]
pub struct MemorySessionStorage {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    entries: Mutex<HashMap<String, PersistedSession>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Seeds an entry as if a previous run had saved it.
    pub fn with_entry(self, store_id: &str, session: PersistedSession) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(store_id.to_string(), session);
        }
        self
    }

    /// Snapshot of the current entry for `store_id`.
    pub fn entry(&self, store_id: &str) -> Option<PersistedSession> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(store_id).cloned())
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self, store_id: &str) -> Result<Option<PersistedSession>, StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated);
        }
        Ok(self.entry(store_id))
    }

    async fn save(&self, store_id: &str, session: &PersistedSession) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated);
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(store_id.to_string(), session.clone());
        }
        Ok(())
    }

    async fn clear(&self, store_id: &str) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Simulated);
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(store_id);
        }
        Ok(())
    }
}

/// StorageState
///
/// The shared handle to the persistence layer held by the auth store.
pub type StorageState = Arc<dyn SessionStorage>;
