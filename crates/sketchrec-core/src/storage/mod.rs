//! Directory persistence for workspaces.
//!
//! A workspace is saved as one record file per stroke, named
//! `stroke-<canvas:02>-<stroke:03>.sr`, plus a `workspace.json` manifest that
//! carries canvas names and the canvas count.

mod directory;
mod manifest;

pub(crate) use directory::{load_canvases, save_canvases};

pub use manifest::MANIFEST_FILE_NAME;

use crate::stroke::StrokeError;
use std::path::PathBuf;
use thiserror::Error;

/// First dash-separated field of every stroke file name.
pub const STROKE_FILE_PREFIX: &str = "stroke";

/// Extension of stroke record files.
pub const STROKE_FILE_EXTENSION: &str = "sr";

/// Most canvases a workspace directory may hold. Stroke files with a higher
/// canvas index are skipped on load.
pub const MAX_CANVASES: usize = 10_000;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Save target is an existing file: {}", .0.display())]
    PathConflict(PathBuf),
    #[error("No such directory: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Directory is empty: {}", .0.display())]
    EmptyDirectory(PathBuf),
    #[error("No stroke files found in {}", .0.display())]
    MalformedWorkspace(PathBuf),
    #[error("Workspace has {0} canvases, at most {max} can be saved", max = MAX_CANVASES)]
    TooManyCanvases(usize),
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Stroke(#[from] StrokeError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// File name of the `stroke`th stroke in the `canvas`th canvas.
pub fn stroke_file_name(canvas: usize, stroke: usize) -> String {
    format!("{STROKE_FILE_PREFIX}-{canvas:02}-{stroke:03}.{STROKE_FILE_EXTENSION}")
}

/// Parse a stroke file name back into `(canvas, stroke)` indices.
///
/// The name must split on `-` into exactly three fields: the literal
/// `stroke`, the canvas index, and the stroke index followed by `.sr`.
pub fn parse_stroke_file_name(name: &str) -> Option<(usize, usize)> {
    let mut fields = name.split('-');
    let (prefix, canvas, last) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() || prefix != STROKE_FILE_PREFIX {
        return None;
    }

    let stroke = last
        .strip_suffix(STROKE_FILE_EXTENSION)?
        .strip_suffix('.')?;
    Some((parse_index(canvas)?, parse_index(stroke)?))
}

fn parse_index(field: &str) -> Option<usize> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
