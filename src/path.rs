//! Owned paths recorded by drawing instructions.
//!
//! A [`Path`] is a plain list of commands in whatever coordinate system it
//! was built in. Instructions capture paths by value and map every vertex
//! to device space only when they run, so the same path can be replayed
//! under a different axis range.

use crate::backend::Backend;
use crate::basics::Rectangle;
use crate::error::Result;

/// One path command. Curves are cubic Béziers from the current point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    },
    Close,
}

/// Path storage: an ordered sequence of commands, possibly several
/// sub-paths each started by `MoveTo`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    cmds: Vec<PathCmd>,
    start: Option<(f64, f64)>,
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all commands.
    pub fn clear(&mut self) {
        self.cmds.clear();
        self.start = None;
    }

    // ---------------------------------------------------------------
    // Path construction
    // ---------------------------------------------------------------

    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.cmds.push(PathCmd::MoveTo(x, y));
        self.start = Some((x, y));
        self
    }

    /// Line to `(x, y)`; starts a sub-path when there is no current point.
    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        if self.current_point().is_none() {
            return self.move_to(x, y);
        }
        self.cmds.push(PathCmd::LineTo(x, y));
        self
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) -> &mut Self {
        if self.current_point().is_none() {
            self.move_to(x1, y1);
        }
        self.cmds.push(PathCmd::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x3,
            y3,
        });
        self
    }

    /// Relative move from the current point (origin when empty).
    pub fn move_rel(&mut self, dx: f64, dy: f64) -> &mut Self {
        let (x, y) = self.current_point().unwrap_or((0.0, 0.0));
        self.move_to(x + dx, y + dy)
    }

    /// Relative line from the current point (origin when empty).
    pub fn line_rel(&mut self, dx: f64, dy: f64) -> &mut Self {
        let (x, y) = self.current_point().unwrap_or((0.0, 0.0));
        self.line_to(x + dx, y + dy)
    }

    /// Close the current sub-path. The current point returns to its start.
    pub fn close(&mut self) -> &mut Self {
        if self.start.is_some() && !matches!(self.cmds.last(), Some(PathCmd::Close)) {
            self.cmds.push(PathCmd::Close);
        }
        self
    }

    /// Closed axis-aligned rectangle as its own sub-path.
    pub fn rectangle(&mut self, x: f64, y: f64, w: f64, h: f64) -> &mut Self {
        self.move_to(x, y)
            .line_to(x + w, y)
            .line_to(x + w, y + h)
            .line_to(x, y + h)
            .close()
    }

    /// Open polyline through `points` as a new sub-path.
    pub fn polyline(points: &[(f64, f64)]) -> Self {
        let mut p = Path::new();
        if let Some((&(x, y), rest)) = points.split_first() {
            p.move_to(x, y);
            for &(x, y) in rest {
                p.line_to(x, y);
            }
        }
        p
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn commands(&self) -> &[PathCmd] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    /// End point of the last command, if any.
    pub fn current_point(&self) -> Option<(f64, f64)> {
        match self.cmds.last()? {
            PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => Some((*x, *y)),
            PathCmd::CurveTo { x3, y3, .. } => Some((*x3, *y3)),
            PathCmd::Close => self.start,
        }
    }

    /// Bounding box of every vertex, curve control points included.
    /// `None` for an empty path.
    pub fn extents(&self) -> Option<Rectangle> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        let mut add = |x: f64, y: f64| {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x1, y1, x2, y2)) => (x1.min(x), y1.min(y), x2.max(x), y2.max(y)),
            });
        };
        for cmd in &self.cmds {
            match *cmd {
                PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => add(x, y),
                PathCmd::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x3,
                    y3,
                } => {
                    add(x1, y1);
                    add(x2, y2);
                    add(x3, y3);
                }
                PathCmd::Close => {}
            }
        }
        bounds.map(|(x1, y1, x2, y2)| Rectangle::from_corners(x1, y1, x2, y2))
    }

    // ---------------------------------------------------------------
    // Transformation and output
    // ---------------------------------------------------------------

    /// Copy of the path with every vertex passed through `f`. Stops at the
    /// first vertex `f` rejects.
    pub fn try_map<F>(&self, mut f: F) -> Result<Path>
    where
        F: FnMut(f64, f64) -> Result<(f64, f64)>,
    {
        let mut out = Path::new();
        for cmd in &self.cmds {
            match *cmd {
                PathCmd::MoveTo(x, y) => {
                    let (x, y) = f(x, y)?;
                    out.move_to(x, y);
                }
                PathCmd::LineTo(x, y) => {
                    let (x, y) = f(x, y)?;
                    out.line_to(x, y);
                }
                PathCmd::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x3,
                    y3,
                } => {
                    let (x1, y1) = f(x1, y1)?;
                    let (x2, y2) = f(x2, y2)?;
                    let (x3, y3) = f(x3, y3)?;
                    out.curve_to(x1, y1, x2, y2, x3, y3);
                }
                PathCmd::Close => {
                    out.close();
                }
            }
        }
        Ok(out)
    }

    /// Append the path to the backend's current path.
    pub fn emit(&self, backend: &mut dyn Backend) {
        for cmd in &self.cmds {
            match *cmd {
                PathCmd::MoveTo(x, y) => backend.move_to(x, y),
                PathCmd::LineTo(x, y) => backend.line_to(x, y),
                PathCmd::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x3,
                    y3,
                } => backend.curve_to(x1, y1, x2, y2, x3, y3),
                PathCmd::Close => backend.close_path(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::recording::{Primitive, RecordingBackend};

    #[test]
    fn test_line_to_without_current_point_moves() {
        let mut p = Path::new();
        p.line_to(1.0, 2.0).line_to(3.0, 4.0);
        assert_eq!(p.commands(), &[PathCmd::MoveTo(1.0, 2.0), PathCmd::LineTo(3.0, 4.0)]);
    }

    #[test]
    fn test_relative_commands() {
        let mut p = Path::new();
        p.move_rel(1.0, 1.0).line_rel(2.0, 0.0).line_rel(0.0, 3.0);
        assert_eq!(p.current_point(), Some((3.0, 4.0)));
    }

    #[test]
    fn test_close_returns_to_start() {
        let mut p = Path::new();
        p.move_to(1.0, 1.0).line_to(5.0, 1.0).close().close();
        assert_eq!(p.len(), 3);
        assert_eq!(p.current_point(), Some((1.0, 1.0)));
    }

    #[test]
    fn test_rectangle_extents() {
        let mut p = Path::new();
        p.rectangle(1.0, 2.0, 3.0, -4.0);
        assert_eq!(p.extents(), Some(Rectangle::new(1.0, -2.0, 3.0, 4.0)));
        assert_eq!(p.commands().last(), Some(&PathCmd::Close));
    }

    #[test]
    fn test_extents_include_control_points() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).curve_to(0.0, 10.0, 5.0, -10.0, 5.0, 0.0);
        assert_eq!(p.extents(), Some(Rectangle::new(0.0, -10.0, 5.0, 20.0)));
        assert_eq!(Path::new().extents(), None);
    }

    #[test]
    fn test_polyline() {
        let p = Path::polyline(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        assert_eq!(p.len(), 3);
        assert!(Path::polyline(&[]).is_empty());
    }

    #[test]
    fn test_try_map() {
        let p = Path::polyline(&[(1.0, 1.0), (2.0, 2.0)]);
        let doubled = p.try_map(|x, y| Ok((2.0 * x, 2.0 * y))).unwrap();
        assert_eq!(doubled.commands(), &[PathCmd::MoveTo(2.0, 2.0), PathCmd::LineTo(4.0, 4.0)]);

        let failed = p.try_map(|x, _| {
            if x > 1.5 {
                Err(Error::InvalidRange { min: x, max: x })
            } else {
                Ok((x, x))
            }
        });
        assert!(failed.is_err());
    }

    #[test]
    fn test_emit() {
        let mut b = RecordingBackend::new(10.0, 10.0);
        let mut p = Path::new();
        p.move_to(0.0, 0.0).curve_to(1.0, 1.0, 2.0, 2.0, 3.0, 3.0).close();
        p.emit(&mut b);
        assert_eq!(
            b.primitives(),
            &[
                Primitive::MoveTo(0.0, 0.0),
                Primitive::CurveTo(1.0, 1.0, 2.0, 2.0, 3.0, 3.0),
                Primitive::ClosePath,
            ]
        );
    }
}
