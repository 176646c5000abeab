//! Collector settings.

use crate::storage::{StorageError, StorageResult};
use crate::stroke::{DEFAULT_CAPACITY, RecordFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Settings file name inside the config directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// User-tunable collector options, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorSettings {
    /// Header layout for saved stroke files.
    pub record_format: RecordFormat,
    /// Initial point buffer for newly begun strokes.
    pub stroke_capacity: usize,
    /// Workspace directory used when none is given.
    pub workspace_dir: Option<PathBuf>,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            record_format: RecordFormat::default(),
            stroke_capacity: DEFAULT_CAPACITY,
            workspace_dir: None,
        }
    }
}

impl CollectorSettings {
    /// Default settings location.
    ///
    /// On Unix: `~/.config/sketchrec/settings.json`
    /// On Windows: `%APPDATA%\sketchrec\settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("sketchrec").join(SETTINGS_FILE_NAME))
    }

    /// Load settings from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(serde_json::from_str(&json)?)
    }

    /// Write settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let io_error = |source: std::io::Error| StorageError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_error)
    }
}
