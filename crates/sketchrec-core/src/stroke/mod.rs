//! Strokes: ordered, time-stamped point sequences.

mod record;

pub use record::{FormatError, RECORD_MAGIC, RECORD_VERSION, RecordFormat};

use crate::point::Point;
use kurbo::{BezPath, Rect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Initial point buffer size for a new stroke.
pub const DEFAULT_CAPACITY: usize = 40;

/// Largest buffer a capacity hint reserves up front. Bigger hints are
/// clamped; the buffer still grows past this on append.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 16;

/// Stroke errors.
#[derive(Debug, Error)]
pub enum StrokeError {
    #[error("point index {index} out of range for stroke of {len} points")]
    OutOfRange { index: isize, len: usize },
    #[error("slice step cannot be zero")]
    ZeroStep,
    #[error("malformed stroke file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for stroke operations.
pub type StrokeResult<T> = Result<T, StrokeError>;

/// Axis-aligned box around every point of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    /// A degenerate box around a single point.
    pub fn from_point(x: i32, y: i32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    /// Grow the box to cover `(x, y)`.
    pub fn include(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> u32 {
        self.max_x.abs_diff(self.min_x)
    }

    pub fn height(&self) -> u32 {
        self.max_y.abs_diff(self.min_y)
    }

    /// Check if `(x, y)` lies inside the box, edges included.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// The box as a renderer rectangle.
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            f64::from(self.min_x),
            f64::from(self.min_y),
            f64::from(self.max_x),
            f64::from(self.max_y),
        )
    }

    fn covering(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::from_point(first.x(), first.y());
        for point in rest {
            bounds.include(point.x(), point.y());
        }
        Some(bounds)
    }
}

/// An ordered, append-only sequence of captured points.
///
/// Insertion order is capture order. Points never change once appended, and
/// the bounding box is kept current on every append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StrokeRepr", into = "StrokeRepr")]
pub struct Stroke {
    points: Vec<Point>,
    bounds: Option<BoundingBox>,
}

impl Default for Stroke {
    fn default() -> Self {
        Self::new()
    }
}

impl Stroke {
    /// Create an empty stroke with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty stroke with room for `capacity` points.
    ///
    /// `capacity` is a hint, clamped to [`MAX_INITIAL_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity.min(MAX_INITIAL_CAPACITY)),
            bounds: None,
        }
    }

    /// Create from existing `(x, y, t)` samples.
    ///
    /// Indices are assigned from position and the bounding box is computed
    /// with one scan.
    pub fn from_points(samples: impl IntoIterator<Item = (i32, i32, i64)>) -> Self {
        let points: Vec<Point> = samples
            .into_iter()
            .enumerate()
            .map(|(i, (x, y, t))| Point::new(x, y, t, index_of(i)))
            .collect();
        let bounds = BoundingBox::covering(&points);
        Self { points, bounds }
    }

    /// Append a point, stamping it with the current time when `t` is `None`.
    pub fn append(&mut self, x: i32, y: i32, t: Option<i64>) -> Point {
        if self.points.len() == self.points.capacity() {
            // Double the buffer.
            self.points.reserve_exact(self.points.capacity().max(1));
        }

        let point = Point::new(x, y, t.unwrap_or_else(now_micros), index_of(self.points.len()));
        self.points.push(point);

        match &mut self.bounds {
            Some(bounds) => bounds.include(x, y),
            None => self.bounds = Some(BoundingBox::from_point(x, y)),
        }
        point
    }

    /// Get the point at `index`. Negative indices count from the end.
    pub fn get(&self, index: isize) -> StrokeResult<Point> {
        let len = self.points.len() as isize;
        let position = if index < 0 { index + len } else { index };
        if !(0..len).contains(&position) {
            return Err(StrokeError::OutOfRange {
                index,
                len: self.points.len(),
            });
        }
        Ok(self.points[position as usize])
    }

    /// A lazy view over `start..stop` taking every `step`th point.
    ///
    /// Bounds are normalized like [`Stroke::get`] and must land within
    /// `0..=len`. A negative step walks backwards; missing bounds then
    /// default to the last point and the start of the stroke.
    pub fn slice(&self, start: Option<isize>, stop: Option<isize>, step: isize) -> StrokeResult<StrokeSlice<'_>> {
        if step == 0 {
            return Err(StrokeError::ZeroStep);
        }

        let len = self.points.len() as isize;
        let bound = |index: isize| -> StrokeResult<isize> {
            let position = if index < 0 { index + len } else { index };
            if (0..=len).contains(&position) {
                Ok(position)
            } else {
                Err(StrokeError::OutOfRange {
                    index,
                    len: self.points.len(),
                })
            }
        };

        let (start, stop) = if step > 0 {
            let start = start.map(bound).transpose()?.unwrap_or(0);
            let stop = stop.map(bound).transpose()?.unwrap_or(len);
            (start, stop)
        } else {
            let start = match start {
                Some(index) => bound(index)?.min(len - 1),
                None => len - 1,
            };
            let stop = stop.map(bound).transpose()?.unwrap_or(-1);
            (start, stop)
        };

        Ok(StrokeSlice {
            stroke: self,
            start,
            stop,
            step,
        })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Size of the point buffer.
    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    /// The most recently appended point.
    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// All points in capture order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Iterate the points in capture order.
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, Point>> {
        self.points.iter().copied()
    }

    /// Bounding box of all points, `None` while the stroke is empty.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// Polyline through the points, for rendering.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();

        let Some((first, rest)) = self.points.split_first() else {
            return path;
        };
        path.move_to(kurbo::Point::from(*first));
        for point in rest {
            path.line_to(kurbo::Point::from(*point));
        }
        path
    }

    /// Write the stroke to `path` in the tagged record format.
    pub fn save(&self, path: impl AsRef<Path>) -> StrokeResult<()> {
        self.save_as(path, RecordFormat::Tagged)
    }

    /// Write the stroke to `path` in the given record format.
    pub fn save_as(&self, path: impl AsRef<Path>, format: RecordFormat) -> StrokeResult<()> {
        let path = path.as_ref();
        let io_error = |source: std::io::Error| StrokeError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_error)?;
        let mut writer = BufWriter::new(file);
        record::encode(&mut writer, &self.points, format).map_err(io_error)?;
        writer.flush().map_err(io_error)?;

        log::debug!("Wrote {} points to {}", self.points.len(), path.display());
        Ok(())
    }

    /// Read a stroke written by [`Stroke::save`] or [`Stroke::save_as`].
    pub fn load(path: impl AsRef<Path>) -> StrokeResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| StrokeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let samples = record::decode(&bytes).map_err(|source| StrokeError::Format {
            path: path.to_path_buf(),
            source,
        })?;

        let stroke = Self::from_points(samples);
        log::debug!("Read {} points from {}", stroke.len(), path.display());
        Ok(stroke)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl<'a> IntoIterator for &'a Stroke {
    type Item = Point;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Point>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A restartable, lazily evaluated range of a stroke's points.
#[derive(Debug, Clone, Copy)]
pub struct StrokeSlice<'a> {
    stroke: &'a Stroke,
    start: isize,
    stop: isize,
    step: isize,
}

impl<'a> StrokeSlice<'a> {
    /// Number of points the slice yields.
    pub fn len(&self) -> usize {
        let span = if self.step > 0 {
            self.stop - self.start
        } else {
            self.start - self.stop
        };
        if span <= 0 {
            0
        } else {
            (span as usize).div_ceil(self.step.unsigned_abs())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a fresh pass over the slice.
    pub fn iter(&self) -> SliceIter<'a> {
        SliceIter {
            stroke: self.stroke,
            next: self.start,
            remaining: self.len(),
            step: self.step,
        }
    }
}

impl<'a> IntoIterator for StrokeSlice<'a> {
    type Item = Point;
    type IntoIter = SliceIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &StrokeSlice<'a> {
    type Item = Point;
    type IntoIter = SliceIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`StrokeSlice`].
#[derive(Debug, Clone)]
pub struct SliceIter<'a> {
    stroke: &'a Stroke,
    next: isize,
    remaining: usize,
    step: isize,
}

impl Iterator for SliceIter<'_> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.remaining == 0 {
            return None;
        }
        let point = self.stroke.points.get(usize::try_from(self.next).ok()?).copied()?;
        self.remaining -= 1;
        self.next = self.next.saturating_add(self.step);
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SliceIter<'_> {}

#[derive(Serialize, Deserialize)]
struct StrokeRepr {
    points: Vec<Sample>,
}

#[derive(Serialize, Deserialize)]
struct Sample {
    x: i32,
    y: i32,
    t: i64,
}

impl From<StrokeRepr> for Stroke {
    fn from(repr: StrokeRepr) -> Self {
        Stroke::from_points(repr.points.into_iter().map(|s| (s.x, s.y, s.t)))
    }
}

impl From<Stroke> for StrokeRepr {
    fn from(stroke: Stroke) -> Self {
        StrokeRepr {
            points: stroke
                .iter()
                .map(|p| Sample {
                    x: p.x(),
                    y: p.y(),
                    t: p.t(),
                })
                .collect(),
        }
    }
}

fn index_of(position: usize) -> u32 {
    u32::try_from(position).unwrap_or(u32::MAX)
}

/// Microseconds since the Unix epoch.
fn now_micros() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_micros()).map_or(i64::MIN, |us| -us),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scanned_bounds(stroke: &Stroke) -> Option<BoundingBox> {
        let mut iter = stroke.iter();
        let first = iter.next()?;
        Some(iter.fold(BoundingBox::from_point(first.x(), first.y()), |mut b, p| {
            b.include(p.x(), p.y());
            b
        }))
    }

    fn triples(stroke: &Stroke) -> Vec<(i32, i32, i64)> {
        stroke.iter().map(|p| (p.x(), p.y(), p.t())).collect()
    }

    fn zigzag(n: usize) -> Stroke {
        let mut stroke = Stroke::new();
        for i in 0..n as i32 {
            let y = if i % 2 == 0 { -i } else { i * 3 };
            stroke.append(i * 7 - 500, y, Some(i64::from(i) * 1_000));
        }
        stroke
    }

    #[test]
    fn test_stroke_creation() {
        let stroke = Stroke::new();
        assert!(stroke.is_empty());
        assert!(stroke.capacity() >= DEFAULT_CAPACITY);
        assert_eq!(stroke.bounds(), None);
        assert!(stroke.last().is_none());
    }

    #[test]
    fn test_append_tracks_length_and_last() {
        let mut stroke = Stroke::with_capacity(2);
        for i in 0..25 {
            let appended = stroke.append(i, -i, Some(i64::from(i)));
            assert_eq!(stroke.len(), (i + 1) as usize);
            assert_eq!(stroke.get(stroke.len() as isize - 1).unwrap(), appended);
            assert_eq!(appended.index(), i as u32);
        }
    }

    #[test]
    fn test_capacity_doubles() {
        let mut stroke = Stroke::with_capacity(4);
        for i in 0..5 {
            stroke.append(i, i, Some(0));
        }
        assert!(stroke.capacity() >= 8);

        let mut empty = Stroke::with_capacity(0);
        empty.append(1, 1, Some(0));
        assert_eq!(empty.len(), 1);
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        let mut stroke = Stroke::with_capacity(usize::MAX / 8);
        assert!(stroke.capacity() >= MAX_INITIAL_CAPACITY);
        assert!(stroke.capacity() < usize::MAX / 8);

        stroke.append(3, 4, Some(5));
        assert_eq!(stroke.get(0).unwrap().pos(), (3, 4));
    }

    #[test]
    fn test_bounds_after_every_append() {
        let mut stroke = Stroke::new();
        let samples = [(5, 5), (-3, 10), (12, -8), (0, 0), (12, 40), (-3, -8)];
        for (x, y) in samples {
            stroke.append(x, y, None);
            assert_eq!(stroke.bounds(), scanned_bounds(&stroke));
        }
        assert_eq!(
            stroke.bounds(),
            Some(BoundingBox {
                min_x: -3,
                min_y: -8,
                max_x: 12,
                max_y: 40
            })
        );
    }

    #[test]
    fn test_missing_timestamp_uses_clock() {
        let mut stroke = Stroke::new();
        let stamped = stroke.append(1, 2, None);
        assert!(stamped.t() > 1_500_000_000_000_000);

        let explicit = stroke.append(1, 2, Some(0));
        assert_eq!(explicit.t(), 0);
    }

    #[test]
    fn test_negative_indexing() {
        let stroke = zigzag(10);
        let len = stroke.len() as isize;
        assert_eq!(stroke.get(-1).unwrap(), stroke.get(len - 1).unwrap());
        assert_eq!(stroke.get(-len).unwrap(), stroke.get(0).unwrap());
        assert!(matches!(
            stroke.get(-len - 1),
            Err(StrokeError::OutOfRange { index, len: 10 }) if index == -11
        ));
        assert!(matches!(stroke.get(len), Err(StrokeError::OutOfRange { .. })));
        assert!(matches!(Stroke::new().get(0), Err(StrokeError::OutOfRange { .. })));
    }

    #[test]
    fn test_slice_forward() {
        let stroke = zigzag(10);
        let slice = stroke.slice(Some(2), Some(9), 3).unwrap();
        let indices: Vec<u32> = slice.iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![2, 5, 8]);
        assert_eq!(slice.len(), 3);

        // Restartable.
        assert_eq!(slice.iter().count(), 3);
        assert_eq!(slice.into_iter().count(), 3);

        let tail: Vec<u32> = stroke.slice(Some(-3), None, 1).unwrap().iter().map(|p| p.index()).collect();
        assert_eq!(tail, vec![7, 8, 9]);
    }

    #[test]
    fn test_slice_backward() {
        let stroke = zigzag(5);
        let all: Vec<u32> = stroke.slice(None, None, -1).unwrap().iter().map(|p| p.index()).collect();
        assert_eq!(all, vec![4, 3, 2, 1, 0]);

        let some: Vec<u32> = stroke.slice(Some(4), Some(0), -2).unwrap().iter().map(|p| p.index()).collect();
        assert_eq!(some, vec![4, 2]);
    }

    #[test]
    fn test_slice_errors_and_empty() {
        let stroke = zigzag(4);
        assert!(matches!(stroke.slice(None, None, 0), Err(StrokeError::ZeroStep)));
        assert!(matches!(stroke.slice(Some(5), None, 1), Err(StrokeError::OutOfRange { .. })));
        assert!(matches!(stroke.slice(None, Some(-5), 1), Err(StrokeError::OutOfRange { .. })));
        assert!(stroke.slice(Some(3), Some(1), 1).unwrap().is_empty());
        assert!(Stroke::new().slice(None, None, -1).unwrap().is_empty());
    }

    #[test]
    fn test_iterate_in_order() {
        let stroke = zigzag(6);
        let indices: Vec<u32> = (&stroke).into_iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_from_points() {
        let stroke = Stroke::from_points(vec![(4, 8, 12), (2, 4, 8), (12, 13, 14), (0, 14, 28), (99, 180, i64::MAX)]);
        assert_eq!(stroke.len(), 5);
        for (i, point) in stroke.iter().enumerate() {
            assert_eq!(point.index(), i as u32);
        }
        assert_eq!(stroke.bounds(), scanned_bounds(&stroke));
        assert_eq!(stroke.get(-1).unwrap().t(), i64::MAX);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        for n in [0, 1, 1000] {
            let stroke = zigzag(n);
            let path = dir.path().join(format!("stroke-{n}.sr"));
            stroke.save(&path).unwrap();

            let loaded = Stroke::load(&path).unwrap();
            assert_eq!(triples(&loaded), triples(&stroke));
            assert_eq!(loaded.bounds(), scanned_bounds(&loaded));
            assert_eq!(loaded, stroke);
        }
    }

    #[test]
    fn test_legacy_save_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.sr");
        let stroke = zigzag(12);
        stroke.save_as(&path, RecordFormat::Legacy).unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 4 + 12 * 16);
        assert_eq!(Stroke::load(&path).unwrap(), stroke);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempdir().unwrap();

        let missing = Stroke::load(dir.path().join("nope.sr"));
        assert!(matches!(missing, Err(StrokeError::Io { .. })));

        let short = dir.path().join("short.sr");
        fs::write(&short, [3u8, 0, 0, 0, 1, 2]).unwrap();
        assert!(matches!(
            Stroke::load(&short),
            Err(StrokeError::Format {
                source: FormatError::Truncated { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_save_to_unwritable_path() {
        let dir = tempdir().unwrap();
        let result = zigzag(3).save(dir.path().join("missing").join("stroke.sr"));
        assert!(matches!(result, Err(StrokeError::Io { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let stroke = zigzag(7);
        let json = stroke.to_json().unwrap();
        let restored = Stroke::from_json(&json).unwrap();
        assert_eq!(restored, stroke);
        assert_eq!(restored.bounds(), stroke.bounds());
    }

    #[test]
    fn test_to_path() {
        assert!(Stroke::new().to_path().elements().is_empty());
        assert_eq!(zigzag(4).to_path().elements().len(), 4);
    }

    #[test]
    fn test_bounding_box_helpers() {
        let mut bounds = BoundingBox::from_point(0, 0);
        bounds.include(10, -5);
        assert_eq!(bounds.width(), 10);
        assert_eq!(bounds.height(), 5);
        assert!(bounds.contains(10, 0));
        assert!(!bounds.contains(11, 0));

        let rect = bounds.to_rect();
        assert!((rect.width() - 10.0).abs() < f64::EPSILON);
        assert!((rect.y0 + 5.0).abs() < f64::EPSILON);
    }
}
