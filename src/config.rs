use std::path::{Path, PathBuf};

use crate::error::ProductivityError;
use crate::storage::KeyValueStore;
use crate::transfer::EXPORT_FILE_NAME;

pub const DATA_DIR_ENV: &str = "PRODUCTIVITY_DATA_DIR";
const APP_DIR_NAME: &str = "productivity-manager";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub export_file_name: String,
}

impl Config {
    /// Resolves the data directory: explicit override, then `PRODUCTIVITY_DATA_DIR`,
    /// then the platform default.
    pub fn resolve(data_dir_override: Option<PathBuf>) -> crate::Result<Self> {
        let env_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        Self::resolve_from(data_dir_override, env_dir)
    }

    fn resolve_from(data_dir_override: Option<PathBuf>, env_dir: Option<PathBuf>) -> crate::Result<Self> {
        let data_dir = data_dir_override
            .or(env_dir)
            .unwrap_or_else(default_data_dir);

        if data_dir.as_os_str().is_empty() {
            return Err(ProductivityError::Configuration("data directory is empty".to_string()));
        }
        if data_dir.is_file() {
            return Err(ProductivityError::Configuration(format!(
                "data directory {} is a file",
                data_dir.display()
            )));
        }

        Ok(Self {
            data_dir,
            export_file_name: EXPORT_FILE_NAME.to_string(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn open_store(&self) -> KeyValueStore {
        KeyValueStore::open_dir(&self.data_dir)
    }
}

fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(APP_DIR_NAME)
    } else if cfg!(target_os = "macos") {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("Library/Application Support")
            .join(APP_DIR_NAME)
    } else {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".local/share")
            .join(APP_DIR_NAME)
    }
}
