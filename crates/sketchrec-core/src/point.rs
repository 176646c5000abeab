//! Captured point samples.

use std::fmt;

/// One captured sample: position, capture time and position within its stroke.
///
/// Points are plain values. The index is assigned by the owning [`Stroke`]
/// when the point is appended or loaded and cannot be set independently.
///
/// [`Stroke`]: crate::Stroke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    x: i32,
    y: i32,
    t: i64,
    index: u32,
}

impl Point {
    pub(crate) fn new(x: i32, y: i32, t: i64, index: u32) -> Self {
        Self { x, y, t, index }
    }

    /// X coordinate.
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Y coordinate.
    pub fn y(&self) -> i32 {
        self.y
    }

    /// Capture time in microseconds since the Unix epoch.
    pub fn t(&self) -> i64 {
        self.t
    }

    /// Position of this point within its stroke.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The `(x, y)` coordinates.
    pub fn pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Short form used in logs: `#i: (x,y) @t`.
    pub fn describe(&self) -> String {
        format!("#{}: ({},{}) @{}", self.index, self.x, self.y, self.t)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {}, {}, {})", self.x, self.y, self.t, self.index)
    }
}

impl From<Point> for kurbo::Point {
    fn from(point: Point) -> Self {
        kurbo::Point::new(f64::from(point.x), f64::from(point.y))
    }
}
