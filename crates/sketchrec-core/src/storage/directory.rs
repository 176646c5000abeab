//! Saving and scanning workspace directories.

use super::manifest::{MANIFEST_FILE_NAME, Manifest};
use super::{MAX_CANVASES, StorageError, StorageResult, parse_stroke_file_name, stroke_file_name};
use crate::canvas::Canvas;
use crate::stroke::{RecordFormat, Stroke};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Write every stroke of every canvas into `dir`.
///
/// Creates `dir` when missing. Each canvas is marked clean once all of its
/// strokes are written. A failure part way leaves earlier files on disk.
/// Returns the number of stroke files written.
pub(crate) fn save_canvases(dir: &Path, canvases: &mut [Canvas], format: RecordFormat) -> StorageResult<usize> {
    if canvases.len() > MAX_CANVASES {
        return Err(StorageError::TooManyCanvases(canvases.len()));
    }

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(StorageError::PathConflict(dir.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("Creating workspace directory {}", dir.display());
            fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Err(source) => {
            return Err(StorageError::Io {
                path: dir.to_path_buf(),
                source,
            });
        }
    }

    Manifest::describe(canvases).write(dir)?;

    let mut written = 0;
    for (i, canvas) in canvases.iter_mut().enumerate() {
        for (j, stroke) in canvas.strokes().iter().enumerate() {
            stroke.save_as(dir.join(stroke_file_name(i, j)), format)?;
            written += 1;
        }
        canvas.mark_clean();
    }

    log::info!(
        "Saved {} strokes across {} canvases to {}",
        written,
        canvases.len(),
        dir.display()
    );
    Ok(written)
}

/// A stroke file found while scanning a workspace directory.
#[derive(Debug)]
struct StrokeFile {
    canvas: usize,
    stroke: usize,
    path: PathBuf,
}

/// Rebuild the canvases saved in `dir`.
///
/// Files whose names do not follow the stroke naming scheme are skipped.
/// Strokes are appended in `(canvas, stroke)` index order, and canvases
/// missing from the sequence are created empty. Returned canvases are clean.
pub(crate) fn load_canvases(dir: &Path) -> StorageResult<Vec<Canvas>> {
    let files = list_files(dir)?;
    if files.is_empty() {
        return Err(StorageError::EmptyDirectory(dir.to_path_buf()));
    }

    let mut found: Vec<StrokeFile> = files
        .into_iter()
        .filter_map(|path| {
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                log::warn!("Skipping {}: name is not valid UTF-8", path.display());
                return None;
            };
            match parse_stroke_file_name(name) {
                Some((canvas, _)) if canvas >= MAX_CANVASES => {
                    log::warn!(
                        "Skipping {}: canvas index {} exceeds the limit of {}",
                        path.display(),
                        canvas,
                        MAX_CANVASES
                    );
                    None
                }
                Some((canvas, stroke)) => Some(StrokeFile { canvas, stroke, path }),
                None => {
                    if name != MANIFEST_FILE_NAME {
                        log::warn!("Skipping {}: not a stroke file", path.display());
                    }
                    None
                }
            }
        })
        .collect();

    if found.is_empty() {
        return Err(StorageError::MalformedWorkspace(dir.to_path_buf()));
    }

    // Directory listings come back in no particular order.
    found.sort_by(|a, b| (a.canvas, a.stroke, &a.path).cmp(&(b.canvas, b.stroke, &b.path)));

    let manifest = Manifest::read(dir);
    let mut canvases: Vec<Canvas> = match &manifest {
        Some(manifest) => manifest
            .canvases
            .iter()
            .map(|entry| Canvas::with_name(entry.name.clone()))
            .collect(),
        None => Vec::new(),
    };

    for file in &found {
        while canvases.len() <= file.canvas {
            canvases.push(Canvas::new());
        }
        canvases[file.canvas].add_stroke(Stroke::load(&file.path)?);
    }

    if let Some(manifest) = &manifest {
        for (canvas, entry) in canvases.iter().zip(&manifest.canvases) {
            if canvas.len() != entry.strokes {
                log::warn!(
                    "Canvas '{}' has {} strokes on disk, manifest lists {}",
                    entry.name,
                    canvas.len(),
                    entry.strokes
                );
            }
        }
    }

    for canvas in &mut canvases {
        canvas.mark_clean();
    }

    log::info!(
        "Loaded {} strokes across {} canvases from {}",
        found.len(),
        canvases.len(),
        dir.display()
    );
    Ok(canvases)
}

/// Paths of the non-directory entries directly inside `dir`.
fn list_files(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    let io_error = |source: std::io::Error| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    };

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(StorageError::NotADirectory(dir.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StorageError::NotFound(dir.to_path_buf()));
        }
        Err(e) => return Err(io_error(e)),
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if !path.is_dir() {
            files.push(path);
        }
    }
    Ok(files)
}
