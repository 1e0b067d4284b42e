//! # axiplot
//!
//! The geometric core of a 2D plotting library: a graph of mutable affine
//! coordinate systems with lazy change propagation, and viewports that
//! record drawing operations and replay them once the data extents are
//! known.
//!
//! - Affine [`Matrix`] algebra with explicit composition order
//! - [`Coordinate`] nodes revalidated on read through version stamps
//! - [`Monitor`] change detection over any node and its ancestors
//! - [`Viewport`]s with Device, Graph, Data and Orthonormal systems
//! - Deferred [`Instruction`] queues with auto-fit of the axis ranges
//! - Grid, row, column and border layouts
//! - Ratio, range and unit-size sync groups with detach-and-freeze
//! - A [`Backend`] drawing contract plus an in-memory [`RecordingBackend`]
//!
//! ## Architecture
//!
//! Rendering goes through two phases:
//!
//! 1. **Record**: drawing calls on a viewport append instructions holding
//!    their arguments in the coordinate system they were given in. Data
//!    submitted with a drawing call widens the axis ranges.
//! 2. **Drain**: [`Viewport::do_instructions`] resolves every instruction
//!    through the coordinate state current at that moment and issues
//!    device-space primitives to the backend.
//!
//! Everything is single-threaded: handles are `Rc`-based and not `Send`.

// Foundation types & math
pub mod basics;
pub mod error;
pub mod matrix;

// Coordinate graph & shared state
pub mod coordinate;
pub mod sync;

// Drawing contract
pub mod backend;
pub mod color;
pub mod path;
pub mod recording;
pub mod registry;
pub mod style;

// Viewports
pub mod axis;
pub mod instruction;
pub mod layout;
pub mod viewport;

pub use crate::axis::{AxisRange, Range};
pub use crate::backend::{Backend, BackendHandle, LineCap, LineJoin, Slant, TextPosition, Weight};
pub use crate::basics::Rectangle;
pub use crate::color::Color;
pub use crate::coordinate::{Coordinate, Monitor, ScopedTransform};
pub use crate::error::{Error, Result};
pub use crate::instruction::Instruction;
pub use crate::layout::{Borders, GridSync, Link};
pub use crate::matrix::{Matrix, RectRef};
pub use crate::path::{Path, PathCmd};
pub use crate::recording::{Primitive, RecordingBackend};
pub use crate::registry::Registry;
pub use crate::style::{Mark, Scalar, Style};
pub use crate::sync::SyncCell;
pub use crate::viewport::{Axes, CoordName, Drain, Viewport};
