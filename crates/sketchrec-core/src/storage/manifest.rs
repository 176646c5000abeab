//! Workspace manifest written next to the stroke files.

use super::{StorageError, StorageResult};
use crate::canvas::Canvas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Name of the manifest file inside a workspace directory.
pub const MANIFEST_FILE_NAME: &str = "workspace.json";

const MANIFEST_VERSION: u32 = 1;

/// Canvas names and counts for a saved workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Manifest {
    pub version: u32,
    pub canvases: Vec<CanvasEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CanvasEntry {
    pub name: String,
    #[serde(default)]
    pub strokes: usize,
}

impl Manifest {
    pub fn describe(canvases: &[Canvas]) -> Self {
        Self {
            version: MANIFEST_VERSION,
            canvases: canvases
                .iter()
                .map(|canvas| CanvasEntry {
                    name: canvas.name().to_string(),
                    strokes: canvas.len(),
                })
                .collect(),
        }
    }

    pub fn write(&self, dir: &Path) -> StorageResult<()> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|source| StorageError::Io { path, source })
    }

    /// Read the manifest in `dir`, if there is a usable one.
    ///
    /// A missing manifest is normal for directories written by older
    /// collectors. An unreadable one is logged and ignored.
    pub fn read(dir: &Path) -> Option<Self> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Self>(&json) {
            Ok(manifest) if manifest.version == MANIFEST_VERSION => Some(manifest),
            Ok(manifest) => {
                log::warn!(
                    "Ignoring manifest {} with unsupported version {}",
                    path.display(),
                    manifest.version
                );
                None
            }
            Err(e) => {
                log::warn!("Ignoring malformed manifest {}: {}", path.display(), e);
                None
            }
        }
    }
}
