//! Sketchrec Core Library
//!
//! Stroke capture data model and its on-disk persistence: time-stamped point
//! sequences, canvases that group them, and a workspace saved as a directory
//! of per-stroke binary records.

pub mod canvas;
pub mod point;
pub mod settings;
pub mod storage;
pub mod stroke;
pub mod workspace;

pub use canvas::Canvas;
pub use point::Point;
pub use settings::CollectorSettings;
pub use storage::{MAX_CANVASES, StorageError, StorageResult, parse_stroke_file_name, stroke_file_name};
pub use stroke::{
    BoundingBox, DEFAULT_CAPACITY, FormatError, MAX_INITIAL_CAPACITY, RecordFormat, Stroke, StrokeError,
    StrokeResult, StrokeSlice,
};
pub use workspace::Workspace;
