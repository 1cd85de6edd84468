//! Per-file settings persistence: a JSON-backed store of layer styling and
//! smoothing, keyed by file identity.
//!
//! The backing file maps a file key (path relative to the user's home
//! directory where possible, absolute otherwise) to the saved configuration:
//!
//! ```json
//! {
//!   "data/measurements.csv": {
//!     "layers": {
//!       "Temperature": { "color": "#1f77b4", "visible": true, "line_width": 2 }
//!     },
//!     "smoothing": 25
//!   }
//! }
//! ```
//!
//! A missing, unreadable or corrupt backing file is never fatal: the store
//! degrades to empty and the failure is logged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::layers::Rgb;

/// Errors from writing (never from reading) the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted visual configuration of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSettings {
    pub color: Rgb,
    pub visible: bool,
    pub line_width: u32,
}

/// Everything persisted for one file: per-layer styling plus the shared
/// smoothing window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub layers: BTreeMap<String, LayerSettings>,
    #[serde(default = "default_smoothing")]
    pub smoothing: u32,
}

fn default_smoothing() -> u32 {
    1
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            layers: BTreeMap::new(),
            smoothing: 1,
        }
    }
}

/// In-memory settings store mirroring one JSON file on disk.
pub struct SettingsStore {
    path: PathBuf,
    entries: BTreeMap<String, FileSettings>,
    home: Option<PathBuf>,
}

impl SettingsStore {
    /// Open the store backed by `path`, reading any existing content.
    /// Corrupt or unreadable content degrades to an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => {
                    log::debug!("loaded settings from {}", path.display());
                    entries
                }
                Err(e) => {
                    log::warn!("ignoring corrupt settings file {}: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("failed to read settings file {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self {
            path,
            entries,
            home: home_dir(),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stable identity key for a data file: its canonical path relative to
    /// the user's home directory if it is a descendant, absolute otherwise.
    pub fn file_key(&self, file: &Path) -> String {
        let abs = std::fs::canonicalize(file).unwrap_or_else(|_| {
            if file.is_absolute() {
                file.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(file))
                    .unwrap_or_else(|_| file.to_path_buf())
            }
        });
        match &self.home {
            Some(home) => match abs.strip_prefix(home) {
                Ok(rel) => rel.to_string_lossy().into_owned(),
                Err(_) => abs.to_string_lossy().into_owned(),
            },
            None => abs.to_string_lossy().into_owned(),
        }
    }

    /// Last-saved configuration for a key, or `None`.
    pub fn get(&self, key: &str) -> Option<&FileSettings> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Overwrite the entry for `key` and persist the whole store.
    pub fn save(&mut self, key: &str, settings: FileSettings) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), settings);
        self.persist()
    }

    /// Delete one entry. A no-op for unknown keys.
    pub fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    /// Clear the in-memory store and delete the backing file.
    pub fn reset_all(&mut self) -> Result<(), SettingsError> {
        self.entries.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("deleted settings file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, text)?;
        log::debug!("saved settings to {}", self.path.display());
        Ok(())
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
