//! Text point streams.
//!
//! One point per line as `x y [t]`. A blank line ends the current stroke,
//! `---` starts a new canvas and `#` starts a comment.

use anyhow::{Context, bail};
use sketchrec_core::Workspace;
use std::io::BufRead;

/// Marker line that starts a new canvas.
const CANVAS_BREAK: &str = "---";

/// What a capture run added.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    pub canvases: usize,
    pub strokes: usize,
    pub points: usize,
}

/// Feed the point stream in `reader` into `workspace`.
///
/// Points go to the last canvas of the workspace. Missing timestamps are
/// taken from the clock.
pub fn capture<R: BufRead>(reader: R, workspace: &mut Workspace) -> anyhow::Result<CaptureSummary> {
    let mut summary = CaptureSummary::default();
    let mut canvas_index = workspace.canvas_count().saturating_sub(1);
    if workspace.canvas_count() == 0 {
        canvas_index = workspace.add_canvas();
    }
    let mut in_stroke = false;

    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", number + 1))?;
        let line = match line.split_once('#') {
            Some((content, _comment)) => content.trim(),
            None => line.trim(),
        };

        if line.is_empty() {
            in_stroke = false;
            continue;
        }
        if line == CANVAS_BREAK {
            in_stroke = false;
            canvas_index = workspace.add_canvas();
            summary.canvases += 1;
            continue;
        }

        let (x, y, t) = parse_point(line).with_context(|| format!("line {}", number + 1))?;
        let Some(canvas) = workspace.canvas_mut(canvas_index) else {
            bail!("canvas {canvas_index} disappeared during capture");
        };
        if in_stroke && canvas.append_point(x, y, t).is_some() {
            summary.points += 1;
        } else {
            canvas.begin_stroke(x, y, t);
            in_stroke = true;
            summary.strokes += 1;
            summary.points += 1;
        }
    }

    log::debug!(
        "Captured {} points in {} strokes, {} new canvases",
        summary.points,
        summary.strokes,
        summary.canvases
    );
    Ok(summary)
}

fn parse_point(line: &str) -> anyhow::Result<(i32, i32, Option<i64>)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (x, y, t) = match fields.as_slice() {
        [x, y] => (x, y, None),
        [x, y, t] => (x, y, Some(t)),
        _ => bail!("expected `x y [t]`, got {line:?}"),
    };

    let x = x.parse::<i32>().with_context(|| format!("bad x coordinate {x:?}"))?;
    let y = y.parse::<i32>().with_context(|| format!("bad y coordinate {y:?}"))?;
    let t = t
        .map(|t| t.parse::<i64>().with_context(|| format!("bad timestamp {t:?}")))
        .transpose()?;
    Ok((x, y, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchrec_core::Stroke;

    fn shape(workspace: &Workspace) -> Vec<Vec<usize>> {
        workspace
            .canvases()
            .iter()
            .map(|c| c.strokes().iter().map(Stroke::len).collect())
            .collect()
    }

    #[test]
    fn test_capture_strokes_and_canvases() {
        let input = "\
# first canvas
0 0 10
1 1 20
2 4 30

5 5 40
---
7 7
8 8 # trailing comment
";
        let mut workspace = Workspace::new();
        let summary = capture(input.as_bytes(), &mut workspace).unwrap();

        assert_eq!(
            summary,
            CaptureSummary {
                canvases: 1,
                strokes: 3,
                points: 6
            }
        );
        assert_eq!(shape(&workspace), vec![vec![3, 1], vec![2]]);
        assert!(workspace.is_dirty());

        let first = workspace.canvas(0).unwrap().stroke(0).unwrap();
        assert_eq!(first.get(-1).unwrap().t(), 30);
        assert_eq!(first.get(-1).unwrap().pos(), (2, 4));
    }

    #[test]
    fn test_capture_rejects_bad_lines() {
        for input in ["1\n", "1 2 3 4\n", "a 2\n", "1 2 soon\n"] {
            let mut workspace = Workspace::new();
            assert!(capture(input.as_bytes(), &mut workspace).is_err(), "{input:?}");
        }
    }

    #[test]
    fn test_error_names_line() {
        let mut workspace = Workspace::new();
        let err = capture("1 2\n3 x\n".as_bytes(), &mut workspace).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_negative_coordinates() {
        let mut workspace = Workspace::new();
        capture("-5 -7 1\n-5 -7 2\n".as_bytes(), &mut workspace).unwrap();
        let stroke = workspace.canvas(0).unwrap().stroke(0).unwrap();
        let bounds = stroke.bounds().unwrap();
        assert_eq!((bounds.min_x, bounds.max_y), (-5, -7));
        assert_eq!(stroke.len(), 2);
    }
}
