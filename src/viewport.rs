//! Viewports: composed coordinate systems plus a deferred instruction queue.
//!
//! A viewport owns four [`Coordinate`] nodes:
//!
//! - **Device**: backend units, origin at the lower-left corner of the
//!   viewport's frame. Parent is the enclosing viewport's Device node, or
//!   the surface root.
//! - **Graph**: the unit square `[0, 1]²` mapped onto the frame (shrunk to
//!   the requested aspect ratio, if any).
//! - **Data**: the current axis ranges mapped onto Graph, in `log10` space
//!   for logarithmic axes.
//! - **Orthonormal**: Graph's origin with the smaller of Graph's two scale
//!   factors on both axes, so circles stay round.
//!
//! Nodes are rebuilt lazily. A child watches the parent node its frame is
//! expressed in with a [`Monitor`] and recomputes its frame only when that
//! node (or anything above it) changed, so a resized surface re-flows every
//! layout on the next read.
//!
//! Drawing calls are recorded as [`Instruction`]s and resolved against the
//! coordinate state current when [`Viewport::do_instructions`] runs. This is
//! what lets data submitted late widen the axis ranges every earlier
//! instruction renders under.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use tracing::{debug, debug_span, warn};

use crate::axis::{AxisRange, Range};
use crate::backend::{BackendHandle, LineCap, LineJoin, Slant, TextPosition, Weight};
use crate::basics::Rectangle;
use crate::color::Color;
use crate::coordinate::{Coordinate, Monitor};
use crate::error::{Error, Result};
use crate::instruction::{Context, Instruction};
use crate::matrix::Matrix;
use crate::path::Path;
use crate::style::{Mark, Scalar, Style};
use crate::sync::SyncCell;

// ============================================================================
// Names and small value types
// ============================================================================

/// The four coordinate systems of a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordName {
    Device,
    Graph,
    Data,
    Orthonormal,
}

impl CoordName {
    pub fn as_str(self) -> &'static str {
        match self {
            CoordName::Device => "device",
            CoordName::Graph => "graph",
            CoordName::Data => "data",
            CoordName::Orthonormal => "orthonormal",
        }
    }
}

impl fmt::Display for CoordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoordName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "device" => Ok(CoordName::Device),
            "graph" => Ok(CoordName::Graph),
            "data" => Ok(CoordName::Data),
            "orthonormal" => Ok(CoordName::Orthonormal),
            _ => Err(Error::UnknownCoordinateName(s.to_string())),
        }
    }
}

/// Axis selector for sync and auto-fit operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Axes {
    pub x: bool,
    pub y: bool,
}

impl Axes {
    pub const NONE: Axes = Axes { x: false, y: false };
    pub const X: Axes = Axes { x: true, y: false };
    pub const Y: Axes = Axes { x: false, y: true };
    pub const BOTH: Axes = Axes { x: true, y: true };
}

/// Outcome of [`Viewport::do_instructions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Drain {
    pub executed: usize,
    pub failed: usize,
}

// ============================================================================
// Mapping snapshot
// ============================================================================

/// To-device matrices of one viewport, taken after a refresh.
#[derive(Debug, Clone)]
pub(crate) struct Mapping {
    device: Matrix,
    graph: Matrix,
    data: Result<Matrix>,
    ortho: Matrix,
    log: (bool, bool),
    reference: f64,
}

impl Mapping {
    pub(crate) fn new(
        device: Matrix,
        graph: Matrix,
        data: Result<Matrix>,
        ortho: Matrix,
        log: (bool, bool),
        reference: f64,
    ) -> Self {
        Self {
            device,
            graph,
            data,
            ortho,
            log,
            reference,
        }
    }

    /// Smaller side of the frame; the unit of relative sizes.
    pub(crate) fn reference(&self) -> f64 {
        self.reference
    }

    pub(crate) fn to_device(&self, coord: CoordName, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(match coord {
            CoordName::Device => self.device.transform_point(x, y),
            CoordName::Graph => self.graph.transform_point(x, y),
            CoordName::Orthonormal => self.ortho.transform_point(x, y),
            CoordName::Data => {
                let m = self.data.as_ref().map_err(Clone::clone)?;
                let x = if self.log.0 { log10_of(x)? } else { x };
                let y = if self.log.1 { log10_of(y)? } else { y };
                m.transform_point(x, y)
            }
        })
    }

    fn to_coord(&self, coord: CoordName, x: f64, y: f64) -> Result<(f64, f64)> {
        match coord {
            CoordName::Device => self.device.inv_transform_point(x, y),
            CoordName::Graph => self.graph.inv_transform_point(x, y),
            CoordName::Orthonormal => self.ortho.inv_transform_point(x, y),
            CoordName::Data => {
                let m = self.data.as_ref().map_err(Clone::clone)?;
                let (x, y) = m.inv_transform_point(x, y)?;
                let x = if self.log.0 { 10f64.powf(x) } else { x };
                let y = if self.log.1 { 10f64.powf(y) } else { y };
                Ok((x, y))
            }
        }
    }

    fn graph_rect(&self) -> Rectangle {
        let (x1, y1) = self.graph.transform_point(0.0, 0.0);
        let (x2, y2) = self.graph.transform_point(1.0, 1.0);
        Rectangle::from_corners(x1, y1, x2, y2)
    }
}

fn log10_of(v: f64) -> Result<f64> {
    if v > 0.0 {
        Ok(v.log10())
    } else {
        Err(Error::InvalidRange { min: v, max: v })
    }
}

// ============================================================================
// Frames
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    North,
    South,
    West,
    East,
    Center,
}

/// Where a viewport's device rectangle comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Frame {
    /// The whole backend surface.
    Surface,
    /// Two corners in one of the parent's coordinate systems.
    Corners {
        coord: CoordName,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    /// One region of a border layout around the parent's Graph rectangle.
    /// Thicknesses are `[north, south, west, east]` in device units.
    Border { side: Side, thickness: [f64; 4] },
}

impl Frame {
    fn watched(&self) -> Option<CoordName> {
        match self {
            Frame::Surface => None,
            Frame::Corners { coord, .. } => Some(*coord),
            Frame::Border { .. } => Some(CoordName::Graph),
        }
    }

    /// Absolute device rectangle. `Ok(None)` when the frame depends on a
    /// parent that no longer exists.
    fn resolve(&self, parent: Option<&Mapping>, surface: (f64, f64)) -> Result<Option<Rectangle>> {
        match (*self, parent) {
            (Frame::Surface, _) => Ok(Some(Rectangle::new(0.0, 0.0, surface.0, surface.1))),
            (_, None) => Ok(None),
            (
                Frame::Corners {
                    coord,
                    x1,
                    y1,
                    x2,
                    y2,
                },
                Some(parent),
            ) => {
                let (ax, ay) = parent.to_device(coord, x1, y1)?;
                let (bx, by) = parent.to_device(coord, x2, y2)?;
                Ok(Some(Rectangle::from_corners(ax, ay, bx, by)))
            }
            (Frame::Border { side, thickness }, Some(parent)) => {
                Ok(Some(border_rect(parent.graph_rect(), side, thickness)))
            }
        }
    }
}

fn border_rect(g: Rectangle, side: Side, [n, s, w, e]: [f64; 4]) -> Rectangle {
    let center = Rectangle::new(
        g.x + w,
        g.y + s,
        (g.w - w - e).max(0.0),
        (g.h - n - s).max(0.0),
    );
    match side {
        Side::Center => center,
        Side::North if n > 0.0 => Rectangle::new(g.x, g.y + g.h - n, g.w, n),
        Side::South if s > 0.0 => Rectangle::new(g.x, g.y, g.w, s),
        Side::West if w > 0.0 => Rectangle::new(g.x, center.y, w, center.h),
        Side::East if e > 0.0 => Rectangle::new(g.x + g.w - e, center.y, e, center.h),
        // Zero thickness: the region coincides with the center.
        _ => center,
    }
}

/// Largest rectangle centred in `r` with `w / h == ratio`.
fn fit_ratio(r: Rectangle, ratio: Option<f64>) -> Rectangle {
    let ratio = match ratio {
        Some(k) if r.w > 0.0 && r.h > 0.0 => k,
        _ => return r,
    };
    if r.w / r.h > ratio {
        let w = r.h * ratio;
        Rectangle::new(r.x + 0.5 * (r.w - w), r.y, w, r.h)
    } else {
        let h = r.w / ratio;
        Rectangle::new(r.x, r.y + 0.5 * (r.h - h), r.w, h)
    }
}

/// Data interval drawn on one axis, in `log10` space for log axes.
fn axis_span(range: AxisRange, log: bool, unit: Option<f64>, extent: f64) -> Result<(f64, f64)> {
    let r = range.resolve(log)?;
    let r = if log { r.log10()? } else { r };
    match unit {
        Some(u) if extent > 0.0 => {
            let half = 0.5 * extent / u;
            Ok((r.center() - half, r.center() + half))
        }
        _ => Ok((r.min, r.max)),
    }
}

fn set_if_changed(node: &Coordinate, m: Matrix) {
    if node.matrix() != m {
        node.set_matrix(m);
    }
}

// ============================================================================
// Viewport
// ============================================================================

struct Inner {
    backend: BackendHandle,
    parent: Option<Weak<RefCell<Inner>>>,
    frame: Frame,
    watch: Option<Monitor>,
    /// Absolute device rectangle from the last frame resolution.
    cached_frame: Option<Rectangle>,
    surface: Coordinate,
    surface_size: (f64, f64),
    device: Coordinate,
    graph: Coordinate,
    data: Coordinate,
    ortho: Coordinate,
    xlog: bool,
    ylog: bool,
    ratio: SyncCell<Option<f64>>,
    xrange: SyncCell<AxisRange>,
    yrange: SyncCell<AxisRange>,
    xunit: SyncCell<Option<f64>>,
    yunit: SyncCell<Option<f64>>,
    style: Style,
    saved: Vec<Style>,
    queue: Vec<Instruction>,
    /// Creation order. The caller's handles own the children.
    children: Vec<Weak<RefCell<Inner>>>,
}

impl Inner {
    fn new(
        backend: BackendHandle,
        parent: Option<Weak<RefCell<Inner>>>,
        frame: Frame,
        surface: Coordinate,
        parent_device: &Coordinate,
    ) -> Self {
        let device = Coordinate::make_identity(parent_device);
        let graph = Coordinate::make_identity(&device);
        let data = Coordinate::make_identity(&graph);
        let ortho = Coordinate::make_identity(&device);
        Self {
            backend,
            parent,
            frame,
            watch: None,
            cached_frame: None,
            surface,
            surface_size: (0.0, 0.0),
            device,
            graph,
            data,
            ortho,
            xlog: false,
            ylog: false,
            ratio: SyncCell::new(None),
            xrange: SyncCell::new(AxisRange::default()),
            yrange: SyncCell::new(AxisRange::default()),
            xunit: SyncCell::new(None),
            yunit: SyncCell::new(None),
            style: Style::default(),
            saved: Vec::new(),
            queue: Vec::new(),
            children: Vec::new(),
        }
    }

    fn node(&self, name: CoordName) -> &Coordinate {
        match name {
            CoordName::Device => &self.device,
            CoordName::Graph => &self.graph,
            CoordName::Data => &self.data,
            CoordName::Orthonormal => &self.ortho,
        }
    }

    /// Absolute device rectangle of the frame; recomputed only when the
    /// surface size or the watched parent node changed.
    fn frame_rect(&mut self, parent: Option<&Mapping>) -> Rectangle {
        let stale = match self.frame {
            Frame::Surface => {
                let size = {
                    let b = self.backend.borrow();
                    (b.width(), b.height())
                };
                let resized = size != self.surface_size;
                self.surface_size = size;
                resized
            }
            _ => self.watch.as_mut().map_or(false, Monitor::take_change),
        };
        if stale || self.cached_frame.is_none() {
            match self.frame.resolve(parent, self.surface_size) {
                Ok(Some(r)) => {
                    debug!(frame = ?self.frame, rect = ?r, "viewport frame recomputed");
                    self.cached_frame = Some(r);
                }
                // Parent gone: keep what was last resolved.
                Ok(None) => {}
                Err(e) => debug!(error = %e, "viewport frame unresolved, keeping previous"),
            }
        }
        self.cached_frame.unwrap_or_default()
    }

    /// Bring every node up to date with the frame and axis state.
    fn rebuild(&mut self, frame: Rectangle, origin: (f64, f64)) -> Mapping {
        let local = Rectangle::new(0.0, 0.0, frame.w, frame.h);
        let g = fit_ratio(local, self.ratio.get());

        set_if_changed(&self.device, Matrix::make_translate(frame.x - origin.0, frame.y - origin.1));
        set_if_changed(&self.graph, Matrix::make_rectangle(&g));
        let s = g.w.min(g.h);
        set_if_changed(&self.ortho, Matrix::new(s, 0.0, 0.0, s, g.x, g.y));

        let data = self.data_matrix(g.w, g.h);
        if let Ok(m) = &data {
            set_if_changed(&self.data, *m);
        }

        Mapping::new(
            self.device.to_device_matrix(),
            self.graph.to_device_matrix(),
            data.map(|_| self.data.to_device_matrix()),
            self.ortho.to_device_matrix(),
            (self.xlog, self.ylog),
            frame.w.min(frame.h),
        )
    }

    /// Data relative to Graph: the drawn data interval onto `[0, 1]`.
    fn data_matrix(&self, graph_w: f64, graph_h: f64) -> Result<Matrix> {
        let (x0, x1) = axis_span(self.xrange.get(), self.xlog, self.xunit.get(), graph_w)?;
        let (y0, y1) = axis_span(self.yrange.get(), self.ylog, self.yunit.get(), graph_h)?;
        let (kx, ky) = (1.0 / (x1 - x0), 1.0 / (y1 - y0));
        Ok(Matrix::new(kx, 0.0, 0.0, ky, -x0 * kx, -y0 * ky))
    }
}

/// A rectangular plotting area on a backend surface.
///
/// `Viewport` is a cheap handle; clones refer to the same viewport. The
/// viewport lives as long as some handle to it does: parents and children
/// only point at each other weakly. Dropping the last handle discards the
/// viewport together with its pending instructions and leaves its sync
/// groups, whose remaining members keep the shared value.
#[derive(Clone)]
pub struct Viewport {
    inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Viewport")
            .field("frame", &inner.frame)
            .field("rect", &inner.cached_frame)
            .field("pending", &inner.queue.len())
            .field("children", &inner.children.iter().filter(|c| c.strong_count() > 0).count())
            .finish()
    }
}

impl Viewport {
    // ====================================================================
    // Construction
    // ====================================================================

    /// Root viewport covering the whole surface.
    pub fn new(backend: BackendHandle) -> Viewport {
        let surface = Coordinate::make_root(Matrix::identity());
        let inner = Inner::new(backend, None, Frame::Surface, surface.clone(), &surface);
        let vp = Viewport {
            inner: Rc::new(RefCell::new(inner)),
        };
        vp.refresh();
        vp
    }

    /// Child viewport spanning `rect` in the `coord` system of `self`.
    pub fn make(&self, coord: CoordName, rect: Rectangle) -> Result<Viewport> {
        // Reject corners that cannot be placed before creating anything.
        let mapping = self.refresh();
        mapping.to_device(coord, rect.x1(), rect.y1())?;
        mapping.to_device(coord, rect.x2(), rect.y2())?;
        Ok(self.make_framed(Frame::Corners {
            coord,
            x1: rect.x1(),
            y1: rect.y1(),
            x2: rect.x2(),
            y2: rect.y2(),
        }))
    }

    pub(crate) fn make_framed(&self, frame: Frame) -> Viewport {
        let child = {
            let parent = self.inner.borrow();
            let mut inner = Inner::new(
                parent.backend.clone(),
                Some(Rc::downgrade(&self.inner)),
                frame,
                parent.surface.clone(),
                &parent.device,
            );
            inner.watch = frame.watched().map(|name| parent.node(name).monitor());
            Viewport {
                inner: Rc::new(RefCell::new(inner)),
            }
        };
        self.inner.borrow_mut().children.push(Rc::downgrade(&child.inner));
        child.refresh();
        child
    }

    // ====================================================================
    // Structure
    // ====================================================================

    pub fn backend(&self) -> BackendHandle {
        self.inner.borrow().backend.clone()
    }

    /// `true` if both viewports draw on the same surface.
    pub fn shares_backend(&self, other: &Viewport) -> bool {
        Rc::ptr_eq(&self.inner.borrow().backend, &other.inner.borrow().backend)
    }

    pub fn ptr_eq(&self, other: &Viewport) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn parent(&self) -> Option<Viewport> {
        let weak = self.inner.borrow().parent.clone()?;
        weak.upgrade().map(|inner| Viewport { inner })
    }

    /// Live children in creation order. Entries of discarded children
    /// are pruned.
    pub fn children(&self) -> Vec<Viewport> {
        let mut inner = self.inner.borrow_mut();
        inner.children.retain(|c| c.strong_count() > 0);
        inner
            .children
            .iter()
            .filter_map(Weak::upgrade)
            .map(|inner| Viewport { inner })
            .collect()
    }

    // ====================================================================
    // Coordinates
    // ====================================================================

    /// Revalidate the parent chain and this viewport's nodes.
    pub(crate) fn refresh(&self) -> Mapping {
        let parent = self.parent();
        let parent_map = parent.as_ref().map(Viewport::refresh);
        let mut inner = self.inner.borrow_mut();
        let frame = inner.frame_rect(parent_map.as_ref());
        let origin = match &parent_map {
            Some(m) => m.device.transform_point(0.0, 0.0),
            None => match inner.device.parent() {
                Some(p) => p.to_device(0.0, 0.0),
                None => (0.0, 0.0),
            },
        };
        inner.rebuild(frame, origin)
    }

    /// Up-to-date node for `name`.
    pub fn coordinate(&self, name: CoordName) -> Coordinate {
        self.refresh();
        self.inner.borrow().node(name).clone()
    }

    /// Like [`Viewport::coordinate`], by name.
    pub fn coordinate_named(&self, name: &str) -> Result<Coordinate> {
        Ok(self.coordinate(name.parse()?))
    }

    /// Device position of a point given in `coord`. Log axes apply to Data.
    pub fn to_device(&self, coord: CoordName, x: f64, y: f64) -> Result<(f64, f64)> {
        self.refresh().to_device(coord, x, y)
    }

    /// Inverse of [`Viewport::to_device`].
    pub fn to_coord(&self, coord: CoordName, x: f64, y: f64) -> Result<(f64, f64)> {
        self.refresh().to_coord(coord, x, y)
    }

    /// Absolute device rectangle of the frame.
    pub fn device_rect(&self) -> Rectangle {
        self.refresh();
        self.inner.borrow().cached_frame.unwrap_or_default()
    }

    /// Absolute device rectangle of the Graph unit square (the frame after
    /// aspect-ratio fitting).
    pub fn graph_rect(&self) -> Rectangle {
        self.refresh().graph_rect()
    }

    // ====================================================================
    // Axes
    // ====================================================================

    /// Fix the x range; disables x auto-fit until [`Viewport::reset_autofit`].
    pub fn xrange(&self, min: f64, max: f64) -> Result<()> {
        let range = Range::new(min, max)?;
        let inner = self.inner.borrow();
        if inner.xlog && min <= 0.0 {
            return Err(Error::InvalidRange { min, max });
        }
        inner.xrange.update(|r| r.set(range));
        Ok(())
    }

    /// Fix the y range; disables y auto-fit until [`Viewport::reset_autofit`].
    pub fn yrange(&self, min: f64, max: f64) -> Result<()> {
        let range = Range::new(min, max)?;
        let inner = self.inner.borrow();
        if inner.ylog && min <= 0.0 {
            return Err(Error::InvalidRange { min, max });
        }
        inner.yrange.update(|r| r.set(range));
        Ok(())
    }

    /// Current x range; the default range when nothing was set or fitted.
    pub fn x_range(&self) -> Result<Range> {
        let inner = self.inner.borrow();
        inner.xrange.get().resolve(inner.xlog)
    }

    pub fn y_range(&self) -> Result<Range> {
        let inner = self.inner.borrow();
        inner.yrange.get().resolve(inner.ylog)
    }

    pub fn xmin(&self) -> f64 {
        self.x_range().unwrap_or(Range::DEFAULT).min
    }

    pub fn xmax(&self) -> f64 {
        self.x_range().unwrap_or(Range::DEFAULT).max
    }

    pub fn ymin(&self) -> f64 {
        self.y_range().unwrap_or(Range::DEFAULT).min
    }

    pub fn ymax(&self) -> f64 {
        self.y_range().unwrap_or(Range::DEFAULT).max
    }

    /// Switch the x axis between linear and logarithmic. Fails, leaving the
    /// axis linear, when the current range has a non-positive bound.
    pub fn xlog(&self, on: bool) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if on {
            inner.xrange.get().resolve(true)?;
        }
        inner.xlog = on;
        Ok(())
    }

    pub fn ylog(&self, on: bool) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if on {
            inner.yrange.get().resolve(true)?;
        }
        inner.ylog = on;
        Ok(())
    }

    pub fn is_log(&self) -> (bool, bool) {
        let inner = self.inner.borrow();
        (inner.xlog, inner.ylog)
    }

    /// Widen the tracked data extents to include the rectangle with corners
    /// `(x0, y0)` and `(x1, y1)`. Axes with a fixed range are left alone.
    pub fn auto_fit(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        let inner = self.inner.borrow();
        if inner.xlog && x0.min(x1) <= 0.0 {
            return Err(Error::InvalidRange {
                min: x0.min(x1),
                max: x0.max(x1),
            });
        }
        if inner.ylog && y0.min(y1) <= 0.0 {
            return Err(Error::InvalidRange {
                min: y0.min(y1),
                max: y0.max(y1),
            });
        }
        // Both axes validate before either is written.
        let (mut x, mut y) = (inner.xrange.get(), inner.yrange.get());
        x.fit(x0, x1)?;
        y.fit(y0, y1)?;
        inner.xrange.set(x);
        inner.yrange.set(y);
        Ok(())
    }

    /// Forget the selected ranges and accept auto-fit again.
    pub fn reset_autofit(&self, axes: Axes) {
        let inner = self.inner.borrow();
        if axes.x {
            inner.xrange.update(AxisRange::reset_auto_fit);
        }
        if axes.y {
            inner.yrange.update(AxisRange::reset_auto_fit);
        }
    }

    /// Aspect ratio (`width / height`) imposed on the Graph rectangle, or
    /// `None` to fill the frame.
    pub fn set_ratio(&self, ratio: Option<f64>) -> Result<()> {
        if let Some(r) = ratio {
            if !(r.is_finite() && r > 0.0) {
                return Err(Error::InvalidLayout(format!("aspect ratio {r}")));
            }
        }
        self.inner.borrow().ratio.set(ratio);
        Ok(())
    }

    pub fn ratio(&self) -> Option<f64> {
        self.inner.borrow().ratio.get()
    }

    /// Device units per x data unit; the x range is re-centred to match.
    pub fn set_unit_size_x(&self, size: Option<f64>) -> Result<()> {
        check_unit(size)?;
        self.inner.borrow().xunit.set(size);
        Ok(())
    }

    pub fn set_unit_size_y(&self, size: Option<f64>) -> Result<()> {
        check_unit(size)?;
        self.inner.borrow().yunit.set(size);
        Ok(())
    }

    pub fn unit_size(&self) -> (Option<f64>, Option<f64>) {
        let inner = self.inner.borrow();
        (inner.xunit.get(), inner.yunit.get())
    }

    // ====================================================================
    // Sync groups
    // ====================================================================

    /// Run `f` on (self, base) after checking both draw on one surface.
    fn with_pair(&self, base: &Viewport, f: impl FnOnce(&mut Inner, &Inner)) -> Result<()> {
        if !self.shares_backend(base) {
            return Err(Error::IncompatibleBackend);
        }
        if self.ptr_eq(base) {
            return Ok(());
        }
        let base = base.inner.borrow();
        f(&mut *self.inner.borrow_mut(), &*base);
        Ok(())
    }

    /// Share `base`'s aspect ratio, adopting its current value.
    pub fn sync_ratio(&self, base: &Viewport) -> Result<()> {
        self.with_pair(base, |me, base| me.ratio.join(&base.ratio))
    }

    /// Share `base`'s range on the selected axes, adopting its values and
    /// auto-fit state.
    pub fn sync_range(&self, base: &Viewport, axes: Axes) -> Result<()> {
        self.with_pair(base, |me, base| {
            if axes.x {
                me.xrange.join(&base.xrange);
            }
            if axes.y {
                me.yrange.join(&base.yrange);
            }
        })
    }

    pub fn sync_unit_size(&self, base: &Viewport, axes: Axes) -> Result<()> {
        self.with_pair(base, |me, base| {
            if axes.x {
                me.xunit.join(&base.xunit);
            }
            if axes.y {
                me.yunit.join(&base.yunit);
            }
        })
    }

    /// Leave the ratio group, keeping the current value.
    pub fn desync_ratio(&self) {
        self.inner.borrow_mut().ratio.detach();
    }

    pub fn desync_range(&self, axes: Axes) {
        let mut inner = self.inner.borrow_mut();
        if axes.x {
            inner.xrange.detach();
        }
        if axes.y {
            inner.yrange.detach();
        }
    }

    pub fn desync_unit_size(&self, axes: Axes) {
        let mut inner = self.inner.borrow_mut();
        if axes.x {
            inner.xunit.detach();
        }
        if axes.y {
            inner.yunit.detach();
        }
    }

    // ====================================================================
    // Recorded drawing
    // ====================================================================

    /// Append an instruction to the queue.
    pub fn record(&self, instr: Instruction) {
        self.inner.borrow_mut().queue.push(instr);
    }

    pub fn set_color(&self, color: Color) {
        self.record(Instruction::SetColor(color));
    }

    pub fn set_line_width(&self, width: Scalar) {
        self.record(Instruction::SetLineWidth(width));
    }

    pub fn set_font_size(&self, size: Scalar) {
        self.record(Instruction::SetFontSize(size));
    }

    pub fn set_mark_size(&self, size: Scalar) {
        self.record(Instruction::SetMarkSize(size));
    }

    pub fn set_line_cap(&self, cap: LineCap) {
        self.record(Instruction::SetLineCap(cap));
    }

    pub fn set_line_join(&self, join: LineJoin) {
        self.record(Instruction::SetLineJoin(join));
    }

    pub fn set_dash(&self, offset: f64, dashes: &[f64]) {
        self.record(Instruction::SetDash(offset, dashes.to_vec()));
    }

    pub fn select_font_face(&self, slant: Slant, weight: Weight, family: &str) {
        self.record(Instruction::SelectFontFace(slant, weight, family.to_string()));
    }

    /// Record a stroke of `path`. With `fit` and Data coordinates, the path
    /// extents are folded into the axis ranges first.
    pub fn stroke(&self, coord: CoordName, path: &Path, fit: bool) -> Result<()> {
        self.fit_path(coord, path, fit)?;
        self.record(Instruction::Stroke {
            coord,
            path: path.clone(),
        });
        Ok(())
    }

    pub fn fill(&self, coord: CoordName, path: &Path, fit: bool) -> Result<()> {
        self.fit_path(coord, path, fit)?;
        self.record(Instruction::Fill {
            coord,
            path: path.clone(),
        });
        Ok(())
    }

    pub fn show_text(&self, coord: CoordName, x: f64, y: f64, rotate: f64, pos: TextPosition, text: &str) {
        self.record(Instruction::ShowText {
            coord,
            x,
            y,
            rotate,
            pos,
            text: text.to_string(),
        });
    }

    /// Record a mark at data point `(x, y)` and fit the point.
    pub fn mark(&self, x: f64, y: f64, mark: Mark) -> Result<()> {
        self.auto_fit(x, y, x, y)?;
        self.record(Instruction::Mark { x, y, mark });
        Ok(())
    }

    pub fn clip_rectangle(&self, coord: CoordName, rect: Rectangle) {
        self.record(Instruction::ClipRectangle { coord, rect });
    }

    pub fn save(&self) {
        self.record(Instruction::Save);
    }

    pub fn restore(&self) {
        self.record(Instruction::Restore);
    }

    fn fit_path(&self, coord: CoordName, path: &Path, fit: bool) -> Result<()> {
        if !fit || coord != CoordName::Data {
            return Ok(());
        }
        match path.extents() {
            Some(r) => self.auto_fit(r.x1(), r.y1(), r.x2(), r.y2()),
            None => Ok(()),
        }
    }

    // ====================================================================
    // Direct drawing
    // ====================================================================

    /// Execute `instr` now, against the coordinate state at call time.
    pub fn execute_direct(&self, instr: &Instruction) -> Result<()> {
        let mapping = self.refresh();
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let backend = inner.backend.clone();
        let mut backend = backend.borrow_mut();
        let ctm = inner.surface.use_on(&mut *backend);
        let r = instr.execute(&mut Context {
            backend: &mut *backend,
            style: &mut inner.style,
            saved: &mut inner.saved,
            mapping: &mapping,
        });
        Coordinate::restore(&mut *backend, ctm);
        r
    }

    pub fn set_color_direct(&self, color: Color) -> Result<()> {
        self.execute_direct(&Instruction::SetColor(color))
    }

    pub fn set_line_width_direct(&self, width: Scalar) -> Result<()> {
        self.execute_direct(&Instruction::SetLineWidth(width))
    }

    pub fn set_font_size_direct(&self, size: Scalar) -> Result<()> {
        self.execute_direct(&Instruction::SetFontSize(size))
    }

    pub fn set_mark_size_direct(&self, size: Scalar) -> Result<()> {
        self.execute_direct(&Instruction::SetMarkSize(size))
    }

    pub fn set_line_cap_direct(&self, cap: LineCap) -> Result<()> {
        self.execute_direct(&Instruction::SetLineCap(cap))
    }

    pub fn set_line_join_direct(&self, join: LineJoin) -> Result<()> {
        self.execute_direct(&Instruction::SetLineJoin(join))
    }

    pub fn set_dash_direct(&self, offset: f64, dashes: &[f64]) -> Result<()> {
        self.execute_direct(&Instruction::SetDash(offset, dashes.to_vec()))
    }

    pub fn stroke_direct(&self, coord: CoordName, path: &Path) -> Result<()> {
        self.execute_direct(&Instruction::Stroke {
            coord,
            path: path.clone(),
        })
    }

    pub fn fill_direct(&self, coord: CoordName, path: &Path) -> Result<()> {
        self.execute_direct(&Instruction::Fill {
            coord,
            path: path.clone(),
        })
    }

    pub fn show_text_direct(
        &self,
        coord: CoordName,
        x: f64,
        y: f64,
        rotate: f64,
        pos: TextPosition,
        text: &str,
    ) -> Result<()> {
        self.execute_direct(&Instruction::ShowText {
            coord,
            x,
            y,
            rotate,
            pos,
            text: text.to_string(),
        })
    }

    pub fn mark_direct(&self, x: f64, y: f64, mark: Mark) -> Result<()> {
        self.execute_direct(&Instruction::Mark { x, y, mark })
    }

    pub fn clip_rectangle_direct(&self, coord: CoordName, rect: Rectangle) -> Result<()> {
        self.execute_direct(&Instruction::ClipRectangle { coord, rect })
    }

    // ====================================================================
    // Queue
    // ====================================================================

    /// Snapshot of the pending instructions, oldest first.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.inner.borrow().queue.clone()
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Drop pending instructions without running them.
    pub fn clear_instructions(&self) {
        self.inner.borrow_mut().queue.clear();
    }

    /// Style as left by the last executed instruction.
    pub fn style(&self) -> Style {
        self.inner.borrow().style.clone()
    }

    /// Run and clear the queue of this viewport, then of each child in
    /// creation order.
    ///
    /// A failing instruction is logged and counted; the rest of the queue
    /// still runs. Calling this on empty queues does nothing.
    pub fn do_instructions(&self) -> Drain {
        let _span = debug_span!("do_instructions").entered();
        let mut report = Drain::default();
        self.drain_into(&mut report);
        debug!(executed = report.executed, failed = report.failed, "drain finished");
        report
    }

    fn drain_into(&self, report: &mut Drain) {
        let queue = std::mem::take(&mut self.inner.borrow_mut().queue);
        if !queue.is_empty() {
            let mapping = self.refresh();
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let backend = inner.backend.clone();
            let mut backend = backend.borrow_mut();

            backend.save();
            let ctm = inner.surface.use_on(&mut *backend);
            inner.style.apply(&mut *backend, mapping.reference());
            let depth = inner.saved.len();
            for (index, instr) in queue.iter().enumerate() {
                let r = instr.execute(&mut Context {
                    backend: &mut *backend,
                    style: &mut inner.style,
                    saved: &mut inner.saved,
                    mapping: &mapping,
                });
                match r {
                    Ok(()) => report.executed += 1,
                    Err(error) => {
                        warn!(index, ?instr, %error, "instruction failed");
                        report.failed += 1;
                    }
                }
            }
            // Unbalanced saves from this queue.
            while inner.saved.len() > depth {
                if let Some(style) = inner.saved.pop() {
                    inner.style = style;
                }
                backend.restore();
            }
            Coordinate::restore(&mut *backend, ctm);
            backend.restore();
        }
        for child in self.children() {
            child.drain_into(report);
        }
    }
}

fn check_unit(size: Option<f64>) -> Result<()> {
    match size {
        Some(u) if !(u.is_finite() && u > 0.0) => Err(Error::InvalidLayout(format!("unit size {u}"))),
        _ => Ok(()),
    }
}
