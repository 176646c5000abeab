//! Workspace: the ordered set of canvases a collector session works on.

use crate::canvas::Canvas;
use crate::settings::CollectorSettings;
use crate::storage::{self, StorageResult};
use crate::stroke::{DEFAULT_CAPACITY, RecordFormat, Stroke};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An ordered collection of canvases, persisted as a directory of stroke
/// files.
///
/// A canvas's position is its index in the saved file names, so reordering
/// canvases renames their files on the next save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    canvases: Vec<Canvas>,
    /// Header layout used when saving strokes.
    #[serde(skip)]
    record_format: RecordFormat,
    /// Point buffer size for strokes begun on new canvases.
    #[serde(skip, default = "default_capacity")]
    stroke_capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Create a workspace holding one empty canvas.
    pub fn new() -> Self {
        Self {
            canvases: vec![Canvas::new()],
            record_format: RecordFormat::default(),
            stroke_capacity: DEFAULT_CAPACITY,
        }
    }

    /// Create a workspace configured from `settings`.
    pub fn with_settings(settings: &CollectorSettings) -> Self {
        let mut workspace = Self::new();
        workspace.apply_settings(settings);
        workspace
    }

    /// Apply the record format and stroke capacity from `settings`.
    pub fn apply_settings(&mut self, settings: &CollectorSettings) {
        self.set_record_format(settings.record_format);
        self.set_stroke_capacity(settings.stroke_capacity);
    }

    /// Set the header layout used by [`Workspace::save_to`].
    pub fn set_record_format(&mut self, format: RecordFormat) {
        self.record_format = format;
    }

    pub fn record_format(&self) -> RecordFormat {
        self.record_format
    }

    /// Set the point buffer size for strokes begun on any canvas.
    pub fn set_stroke_capacity(&mut self, capacity: usize) {
        self.stroke_capacity = capacity;
        for canvas in &mut self.canvases {
            canvas.set_stroke_capacity(capacity);
        }
    }

    /// Append a new empty canvas. Returns its index.
    pub fn add_canvas(&mut self) -> usize {
        let mut canvas = Canvas::new();
        canvas.set_stroke_capacity(self.stroke_capacity);
        self.canvases.push(canvas);
        self.canvases.len() - 1
    }

    /// Canvases in order.
    pub fn canvases(&self) -> &[Canvas] {
        &self.canvases
    }

    /// Get a canvas by index.
    pub fn canvas(&self, index: usize) -> Option<&Canvas> {
        self.canvases.get(index)
    }

    /// Get a mutable reference to a canvas by index.
    pub fn canvas_mut(&mut self, index: usize) -> Option<&mut Canvas> {
        self.canvases.get_mut(index)
    }

    pub fn canvas_count(&self) -> usize {
        self.canvases.len()
    }

    /// Total strokes across every canvas.
    pub fn stroke_count(&self) -> usize {
        self.canvases.iter().map(Canvas::len).sum()
    }

    /// Check if any canvas has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.canvases.iter().any(Canvas::is_dirty)
    }

    /// Every stroke, canvas by canvas, in order.
    pub fn all_strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.canvases.iter().flat_map(|canvas| canvas.strokes().iter())
    }

    /// Replace everything with a single clean canvas holding `strokes`.
    pub fn set_strokes(&mut self, strokes: impl IntoIterator<Item = Stroke>) {
        self.canvases.clear();
        let index = self.add_canvas();
        self.canvases[index].set_strokes(strokes);
    }

    /// Drop the strokes of every canvas. Dirty flags are left as they were.
    pub fn clear_strokes(&mut self) {
        for canvas in &mut self.canvases {
            canvas.clear();
        }
    }

    /// Start over with one empty, clean canvas.
    pub fn reset(&mut self) {
        self.set_strokes(Vec::new());
    }

    /// Save every stroke into `dir`, one file per stroke.
    ///
    /// Creates `dir` if needed and fails with
    /// [`StorageError::PathConflict`](crate::StorageError::PathConflict) if it
    /// is a plain file. Not transactional: a failure part way through keeps
    /// the files already written, and only fully written canvases are marked
    /// clean. Returns the number of stroke files written.
    pub fn save_to(&mut self, dir: impl AsRef<Path>) -> StorageResult<usize> {
        storage::save_canvases(dir.as_ref(), &mut self.canvases, self.record_format)
    }

    /// Replace the contents with the workspace saved in `dir`.
    ///
    /// The directory is scanned and fully loaded before anything is
    /// replaced, so on error the workspace is left untouched.
    pub fn load_from(&mut self, dir: impl AsRef<Path>) -> StorageResult<()> {
        let mut canvases = storage::load_canvases(dir.as_ref())?;
        for canvas in &mut canvases {
            canvas.set_stroke_capacity(self.stroke_capacity);
        }
        self.canvases = canvases;
        Ok(())
    }

    /// Open the workspace saved in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let mut workspace = Self::new();
        workspace.load_from(dir)?;
        Ok(workspace)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON. Canvases come back clean.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
