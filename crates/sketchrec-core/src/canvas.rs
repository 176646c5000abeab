//! Canvases: ordered stroke collections with dirty tracking.

use crate::point::Point;
use crate::stroke::{DEFAULT_CAPACITY, Stroke};
use serde::{Deserialize, Serialize};

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// A named, ordered collection of strokes.
///
/// Stroke order matters: a stroke's position is its index in the saved file
/// name. The canvas is dirty after any mutation until a successful save or a
/// bulk [`Canvas::set_strokes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Canvas {
    /// Display name.
    name: String,
    /// Strokes in capture order.
    strokes: Vec<Stroke>,
    /// Whether there are unsaved changes.
    #[serde(skip)]
    dirty: bool,
    /// Point buffer size for strokes begun on this canvas.
    #[serde(skip, default = "default_capacity")]
    stroke_capacity: usize,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// Create a new empty, clean canvas.
    pub fn new() -> Self {
        Self::with_name("Untitled")
    }

    /// Create a new empty canvas with the given name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strokes: Vec::new(),
            dirty: false,
            stroke_capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the canvas. Marks it dirty.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.dirty = true;
    }

    /// Set the point buffer size used by [`Canvas::begin_stroke`].
    pub fn set_stroke_capacity(&mut self, capacity: usize) {
        self.stroke_capacity = capacity;
    }

    /// Add a stroke to the end of the canvas. Returns its index.
    pub fn add_stroke(&mut self, stroke: Stroke) -> usize {
        self.strokes.push(stroke);
        self.dirty = true;
        self.strokes.len() - 1
    }

    /// Start a new stroke at `(x, y)`.
    pub fn begin_stroke(&mut self, x: i32, y: i32, t: Option<i64>) -> Point {
        let mut stroke = Stroke::with_capacity(self.stroke_capacity);
        let point = stroke.append(x, y, t);
        self.add_stroke(stroke);
        point
    }

    /// Extend the most recent stroke. Returns `None` if there is no stroke yet.
    pub fn append_point(&mut self, x: i32, y: i32, t: Option<i64>) -> Option<Point> {
        let stroke = self.strokes.last_mut()?;
        let point = stroke.append(x, y, t);
        self.dirty = true;
        Some(point)
    }

    /// Drop every stroke. The dirty flag is left as it was.
    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    /// Replace the contents with `strokes` and mark the canvas clean.
    pub fn set_strokes(&mut self, strokes: impl IntoIterator<Item = Stroke>) {
        self.clear();
        for stroke in strokes {
            self.add_stroke(stroke);
        }
        self.dirty = false;
    }

    /// Strokes in order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Take ownership of the strokes, in order.
    pub fn into_strokes(self) -> Vec<Stroke> {
        self.strokes
    }

    /// Get a stroke by index.
    pub fn stroke(&self, index: usize) -> Option<&Stroke> {
        self.strokes.get(index)
    }

    /// Number of strokes.
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Total points across all strokes.
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    /// Check if the canvas has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: i32) -> Stroke {
        Stroke::from_points((0..n).map(|i| (i, i, i64::from(i))))
    }

    #[test]
    fn test_canvas_creation() {
        let canvas = Canvas::new();
        assert!(canvas.is_empty());
        assert!(!canvas.is_dirty());
        assert_eq!(canvas.name(), "Untitled");
    }

    #[test]
    fn test_add_stroke_marks_dirty() {
        let mut canvas = Canvas::new();
        assert_eq!(canvas.add_stroke(line(3)), 0);
        assert_eq!(canvas.add_stroke(line(1)), 1);
        assert!(canvas.is_dirty());
        assert_eq!(canvas.len(), 2);
        assert_eq!(canvas.point_count(), 4);
    }

    #[test]
    fn test_set_strokes_is_clean() {
        let mut canvas = Canvas::new();
        canvas.add_stroke(line(5));
        assert!(canvas.is_dirty());

        canvas.set_strokes(vec![line(1), line(2), line(3)]);
        assert!(!canvas.is_dirty());
        let lens: Vec<usize> = canvas.strokes().iter().map(Stroke::len).collect();
        assert_eq!(lens, vec![1, 2, 3]);

        canvas.set_strokes(Vec::new());
        assert!(canvas.is_empty());
        assert!(!canvas.is_dirty());
    }

    #[test]
    fn test_clear_leaves_dirty_flag() {
        let mut canvas = Canvas::new();
        canvas.add_stroke(line(2));
        canvas.clear();
        assert!(canvas.is_empty());
        assert!(canvas.is_dirty());

        let mut clean = Canvas::new();
        clean.set_strokes(vec![line(2)]);
        clean.clear();
        assert!(!clean.is_dirty());
    }

    #[test]
    fn test_capture_path() {
        let mut canvas = Canvas::new();
        assert!(canvas.append_point(1, 1, Some(0)).is_none());
        assert!(!canvas.is_dirty());

        canvas.begin_stroke(0, 0, Some(10));
        canvas.set_strokes(canvas.strokes().to_vec());
        assert!(!canvas.is_dirty());

        let point = canvas.append_point(4, 5, Some(20)).unwrap();
        assert_eq!(point.index(), 1);
        assert!(canvas.is_dirty());

        canvas.begin_stroke(9, 9, None);
        assert_eq!(canvas.len(), 2);
        assert_eq!(canvas.stroke(1).map(Stroke::len), Some(1));
    }

    #[test]
    fn test_stroke_capacity() {
        let mut canvas = Canvas::new();
        canvas.set_stroke_capacity(512);
        canvas.begin_stroke(0, 0, Some(0));
        assert!(canvas.strokes()[0].capacity() >= 512);
    }

    #[test]
    fn test_rename_marks_dirty() {
        let mut canvas = Canvas::with_name("First");
        canvas.set_name("Second");
        assert_eq!(canvas.name(), "Second");
        assert!(canvas.is_dirty());
    }

    #[test]
    fn test_serde_skips_dirty() {
        let mut canvas = Canvas::with_name("Sketch");
        canvas.add_stroke(line(3));
        let json = serde_json::to_string(&canvas).unwrap();
        let restored: Canvas = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.name(), "Sketch");
        assert_eq!(restored.strokes(), canvas.strokes());
        assert!(!restored.is_dirty());
    }
}
