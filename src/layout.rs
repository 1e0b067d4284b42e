//! Layout constructors creating several sibling viewports at once.

use tracing::debug;

use crate::error::{Error, Result};
use crate::viewport::{Axes, CoordName, Frame, Side, Viewport};

/// Sync to apply to every viewport a layout creates.
#[derive(Debug, Clone, Copy)]
pub struct Link<'a> {
    pub base: &'a Viewport,
    pub ratio: bool,
    pub range: Axes,
    pub unit_size: Axes,
}

impl<'a> Link<'a> {
    /// Link nothing yet; enable fields as needed.
    pub fn new(base: &'a Viewport) -> Self {
        Self {
            base,
            ratio: false,
            range: Axes::NONE,
            unit_size: Axes::NONE,
        }
    }

    /// Fail before a layout creates anything on `parent`.
    fn check(&self, parent: &Viewport) -> Result<()> {
        if self.base.shares_backend(parent) {
            Ok(())
        } else {
            Err(Error::IncompatibleBackend)
        }
    }

    fn apply(&self, vp: &Viewport) -> Result<()> {
        if self.ratio {
            vp.sync_ratio(self.base)?;
        }
        vp.sync_range(self.base, self.range)?;
        vp.sync_unit_size(self.base, self.unit_size)
    }
}

/// Which grid cells share ranges and ratio.
///
/// `columns.x` links the x range of every cell in a column (stacked plots
/// sharing an abscissa), `rows.y` the y range along a row, and so on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridSync {
    pub columns: Axes,
    pub rows: Axes,
    /// All cells share the first cell's aspect ratio.
    pub ratio: bool,
}

/// The five regions of [`Viewport::layout_borders`].
#[derive(Debug, Clone)]
pub struct Borders {
    pub north: Viewport,
    pub south: Viewport,
    pub west: Viewport,
    pub east: Viewport,
    pub center: Viewport,
}

impl Viewport {
    /// `cols × rows` equal cells over this viewport's Graph square, in
    /// row-major order starting at the top-left cell.
    pub fn layout_grid(
        &self,
        cols: usize,
        rows: usize,
        sync: GridSync,
        link: Option<Link<'_>>,
    ) -> Result<Vec<Viewport>> {
        if cols == 0 || rows == 0 {
            return Err(Error::InvalidLayout(format!("{cols}x{rows} grid")));
        }
        if let Some(link) = &link {
            link.check(self)?;
        }
        debug!(cols, rows, "layout_grid");
        let (fc, fr) = (cols as f64, rows as f64);
        let mut cells = Vec::with_capacity(cols * rows);
        for r in 0..rows {
            for c in 0..cols {
                // Shared edges come from the same expression on both sides.
                let frame = Frame::Corners {
                    coord: CoordName::Graph,
                    x1: c as f64 / fc,
                    y1: (rows - r - 1) as f64 / fr,
                    x2: (c + 1) as f64 / fc,
                    y2: (rows - r) as f64 / fr,
                };
                cells.push(self.make_framed(frame));
            }
        }

        for (i, cell) in cells.iter().enumerate() {
            let (r, c) = (i / cols, i % cols);
            if r > 0 {
                cell.sync_range(&cells[c], sync.columns)?;
            }
            if c > 0 {
                cell.sync_range(&cells[r * cols], sync.rows)?;
            }
            if sync.ratio && i > 0 {
                cell.sync_ratio(&cells[0])?;
            }
            if let Some(link) = &link {
                link.apply(cell)?;
            }
        }
        Ok(cells)
    }

    /// `n` stacked rows, top first.
    pub fn layout_rows(&self, n: usize, sync_x: bool, link: Option<Link<'_>>) -> Result<Vec<Viewport>> {
        let sync = GridSync {
            columns: Axes {
                x: sync_x,
                y: false,
            },
            ..GridSync::default()
        };
        self.layout_grid(1, n, sync, link)
    }

    /// `n` side-by-side columns, left first.
    pub fn layout_columns(&self, n: usize, sync_y: bool, link: Option<Link<'_>>) -> Result<Vec<Viewport>> {
        let sync = GridSync {
            rows: Axes {
                x: false,
                y: sync_y,
            },
            ..GridSync::default()
        };
        self.layout_grid(n, 1, sync, link)
    }

    /// Fixed-thickness borders (device units) around a center region.
    ///
    /// North and south span the full width; west and east fit between
    /// them. Only the center grows or shrinks with the parent. A border of
    /// thickness `0` is not a separate region: its viewport coincides with
    /// the center.
    pub fn layout_borders(
        &self,
        north: f64,
        south: f64,
        west: f64,
        east: f64,
        link: Option<Link<'_>>,
    ) -> Result<Borders> {
        let thickness = [north, south, west, east];
        if thickness.iter().any(|t| !(t.is_finite() && *t >= 0.0)) {
            return Err(Error::InvalidLayout(format!(
                "border thickness {north}/{south}/{west}/{east}"
            )));
        }
        if let Some(link) = &link {
            link.check(self)?;
        }
        debug!(north, south, west, east, "layout_borders");
        let make = |side| self.make_framed(Frame::Border { side, thickness });
        let borders = Borders {
            north: make(Side::North),
            south: make(Side::South),
            west: make(Side::West),
            east: make(Side::East),
            center: make(Side::Center),
        };
        if let Some(link) = &link {
            for vp in [&borders.north, &borders.south, &borders.west, &borders.east, &borders.center] {
                link.apply(vp)?;
            }
        }
        Ok(borders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendHandle;
    use crate::basics::Rectangle;
    use crate::recording::RecordingBackend;
    use std::cell::RefCell;
    use std::rc::Rc;

    const EPS: f64 = 1e-9;

    fn root(w: f64, h: f64) -> Viewport {
        let backend: BackendHandle = Rc::new(RefCell::new(RecordingBackend::new(w, h)));
        Viewport::new(backend)
    }

    fn assert_rect(a: Rectangle, b: Rectangle) {
        let close = (a.x - b.x).abs() < EPS
            && (a.y - b.y).abs() < EPS
            && (a.w - b.w).abs() < EPS
            && (a.h - b.h).abs() < EPS;
        assert!(close, "{a:?} != {b:?}");
    }

    #[test]
    fn test_zero_sized_grid_fails() {
        let vp = root(100.0, 100.0);
        assert!(matches!(
            vp.layout_grid(0, 2, GridSync::default(), None),
            Err(Error::InvalidLayout(_))
        ));
        assert!(vp.layout_rows(0, false, None).is_err());
        assert!(vp.children().is_empty());
    }

    #[test]
    fn test_grid_is_row_major_from_top() {
        let vp = root(300.0, 200.0);
        let cells = vp.layout_grid(3, 2, GridSync::default(), None).unwrap();
        assert_eq!(cells.len(), 6);
        assert_rect(cells[0].device_rect(), Rectangle::new(0.0, 100.0, 100.0, 100.0));
        assert_rect(cells[2].device_rect(), Rectangle::new(200.0, 100.0, 100.0, 100.0));
        assert_rect(cells[3].device_rect(), Rectangle::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_grid_column_sync() {
        let vp = root(100.0, 100.0);
        let sync = GridSync {
            columns: Axes::X,
            ..GridSync::default()
        };
        let cells = vp.layout_grid(2, 2, sync, None).unwrap();
        cells[0].xrange(0.0, 5.0).unwrap();
        assert_eq!(cells[2].xmax(), 5.0);
        assert_eq!(cells[1].xmax(), 1.0);
        assert_eq!(cells[2].ymax(), 1.0);
    }

    #[test]
    fn test_link_applies_to_every_cell() {
        let vp = root(100.0, 100.0);
        let base = vp.make(CoordName::Graph, Rectangle::unit()).unwrap();
        base.yrange(-2.0, 2.0).unwrap();
        let link = Link {
            range: Axes::Y,
            ..Link::new(&base)
        };
        let cols = vp.layout_columns(3, false, Some(link)).unwrap();
        assert!(cols.iter().all(|c| c.ymin() == -2.0));
    }

    #[test]
    fn test_borders() {
        let vp = root(200.0, 100.0);
        let b = vp.layout_borders(10.0, 0.0, 5.0, 0.0, None).unwrap();
        assert_rect(b.north.device_rect(), Rectangle::new(0.0, 90.0, 200.0, 10.0));
        assert_rect(b.west.device_rect(), Rectangle::new(0.0, 0.0, 5.0, 90.0));
        assert_rect(b.center.device_rect(), Rectangle::new(5.0, 0.0, 195.0, 90.0));
        assert_rect(b.south.device_rect(), b.center.device_rect());
        assert_rect(b.east.device_rect(), b.center.device_rect());
    }

    #[test]
    fn test_negative_border_fails() {
        let vp = root(100.0, 100.0);
        assert!(vp.layout_borders(-1.0, 0.0, 0.0, 0.0, None).is_err());
    }

    #[test]
    fn test_foreign_link_creates_nothing() {
        let vp = root(100.0, 100.0);
        let other = root(50.0, 50.0);
        let link = Link {
            range: Axes::X,
            ..Link::new(&other)
        };
        assert_eq!(
            vp.layout_grid(2, 2, GridSync::default(), Some(link)).err(),
            Some(Error::IncompatibleBackend)
        );
        assert_eq!(
            vp.layout_borders(5.0, 5.0, 5.0, 5.0, Some(link)).err(),
            Some(Error::IncompatibleBackend)
        );
        assert!(vp.children().is_empty());
        vp.xrange(0.0, 3.0).unwrap();
        assert_eq!(other.xmax(), 1.0);
    }
}
