use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ProductivityError;

/// Message shown to the user when a write is lost.
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save data. Check storage permissions.";

/// Durable medium holding one JSON blob per key.
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> crate::Result<Option<String>>;
    fn write(&self, key: &str, data: &str) -> crate::Result<()>;
}

/// Non-fatal user notifications raised by the store.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Logs the notification and echoes it on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        warn!("{}", message);
        eprintln!("⚠️  {}", message);
    }
}

/// Get/set of named JSON blobs, tolerant of serialization and I/O failures.
///
/// Cloning is cheap; clones share the same backend.
#[derive(Clone)]
pub struct KeyValueStore {
    backend: Arc<dyn StorageBackend>,
    notifier: Arc<dyn Notifier>,
}

impl KeyValueStore {
    pub fn new<B: StorageBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            notifier: Arc::new(ConsoleNotifier),
        }
    }

    /// File-backed store rooted at `dir`. The directory is created on first write.
    pub fn open_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(dir))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    pub fn with_notifier<N: Notifier + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Returns the value stored under `key`, or `default` when the entry is
    /// absent, unreadable or malformed.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let data = match self.backend.read(key) {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!("No stored entry for '{}', using default", key);
                return default;
            }
            Err(e) => {
                warn!("Error loading '{}' from storage: {}", key, e);
                return default;
            }
        };

        match serde_json::from_str::<T>(&data) {
            Ok(value) => {
                debug!("Loaded '{}' ({} bytes)", key, data.len());
                value
            }
            Err(e) => {
                warn!("Malformed entry for '{}', using default: {}", key, e);
                default
            }
        }
    }

    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key, T::default())
    }

    /// Serializes `value` and writes it under `key`.
    ///
    /// On failure the user is notified and the error is returned; the write
    /// is not retried.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> crate::Result<()> {
        let result = serde_json::to_string(value)
            .map_err(ProductivityError::from)
            .and_then(|data| {
                debug!("Saving '{}' ({} bytes)", key, data.len());
                self.backend.write(key, &data)
            });

        if let Err(e) = &result {
            warn!("Error saving '{}' to storage: {}", key, e);
            self.notifier.notify(SAVE_FAILED_MESSAGE);
        }
        result
    }
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn entry_path(&self, key: &str) -> crate::Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ProductivityError::Storage(format!("Invalid storage key: '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    // Writes to a temporary file in the same directory and renames it into place,
    // so a reader never observes a half-written list.
    fn atomic_write(path: &Path, bytes: &[u8]) -> crate::Result<()> {
        use rand::{thread_rng, Rng};

        let parent = path
            .parent()
            .ok_or_else(|| ProductivityError::Storage("Invalid path".to_string()))?;
        let suffix: u64 = thread_rng().gen();
        let tmp = parent.join(format!(".tmp_productivity.{}.tmp", suffix));

        let result = fs::write(&tmp, bytes).and_then(|_| fs::rename(&tmp, path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        Ok(result?)
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> crate::Result<Option<String>> {
        let path = self.entry_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn write(&self, key: &str, data: &str) -> crate::Result<()> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.dir)?;
        Self::atomic_write(&path, data.as_bytes())
    }
}

/// In-process medium with an optional byte quota across all entries.
///
/// Clones share state, so a test can keep a handle after giving one to a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
    disabled: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Makes every subsequent read and write fail.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    /// Stores `data` verbatim, bypassing quota checks.
    pub fn insert_raw(&self, key: &str, data: &str) {
        if let Ok(mut guard) = self.entries.write() {
            guard.insert(key.to_string(), data.to_string());
        }
    }

    fn check_enabled(&self) -> crate::Result<()> {
        if self.disabled.load(Ordering::SeqCst) {
            Err(ProductivityError::StorageDisabled)
        } else {
            Ok(())
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> crate::Result<Option<String>> {
        self.check_enabled()?;
        let guard = self
            .entries
            .read()
            .map_err(|e| ProductivityError::Storage(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn write(&self, key: &str, data: &str) -> crate::Result<()> {
        self.check_enabled()?;
        let mut guard = self
            .entries
            .write()
            .map_err(|e| ProductivityError::Storage(e.to_string()))?;

        if let Some(quota) = self.quota {
            let others: usize = guard
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let available = quota.saturating_sub(others);
            let needed = key.len() + data.len();
            if needed > available {
                return Err(ProductivityError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        guard.insert(key.to_string(), data.to_string());
        Ok(())
    }
}
