//! Backend drawing contract.
//!
//! A backend is a drawing surface with a current path, a graphics state
//! (colour, line style, font, transform) and a fixed size. Viewports only
//! ever talk to a surface through this trait, during an instruction drain or
//! a `_direct` call; concrete rasterizers, vector emitters and windowed
//! canvases live outside the core.
//!
//! Every backend used by viewports is shared through a [`BackendHandle`]:
//! two viewports draw on the same surface exactly when their handles are
//! [`Rc::ptr_eq`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::basics::Rectangle;
use crate::color::Color;
use crate::matrix::Matrix;

/// Shared, single-threaded handle to a backend surface.
pub type BackendHandle = Rc<RefCell<dyn Backend>>;

/// Line cap style for path endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

/// Line join style at path corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slant {
    #[default]
    Upright,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Weight {
    #[default]
    Normal,
    Bold,
}

/// Where the anchor point of a text lies relative to the text box.
///
/// `Center` puts the box centre on the anchor, `Left` puts the anchor on
/// the left edge (text extends to the right), and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPosition {
    #[default]
    Center,
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// The drawing surface consumed by viewports.
///
/// Coordinates passed to path and text operations are interpreted through
/// the backend's current transform ([`Backend::get_matrix`]). Viewports
/// resolve their own coordinate systems before calling in and install the
/// identity, so a backend never needs to know about them.
pub trait Backend {
    /// Surface width in device units.
    fn width(&self) -> f64;
    /// Surface height in device units.
    fn height(&self) -> f64;

    // Graphics state
    fn set_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    fn line_width(&self) -> f64;
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_dash(&mut self, offset: f64, dashes: &[f64]);

    /// Push every non-path state (style, transform, clip).
    fn save(&mut self);
    /// Pop the state pushed by the matching [`Backend::save`].
    fn restore(&mut self);

    // Transform slot
    fn get_matrix(&self) -> Matrix;
    fn set_matrix(&mut self, m: &Matrix);
    fn translate(&mut self, dx: f64, dy: f64) {
        let mut m = self.get_matrix();
        m.translate(dx, dy);
        self.set_matrix(&m);
    }
    fn scale(&mut self, sx: f64, sy: f64) {
        let mut m = self.get_matrix();
        m.scale(sx, sy);
        self.set_matrix(&m);
    }
    fn rotate(&mut self, angle: f64) {
        let mut m = self.get_matrix();
        m.rotate(angle);
        self.set_matrix(&m);
    }

    // Path construction
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64);
    fn rectangle(&mut self, x: f64, y: f64, w: f64, h: f64);
    /// Circular arc of radius `r` around `(x, y)` from angle `a1` to `a2`
    /// (radians, counter-clockwise).
    fn arc(&mut self, x: f64, y: f64, r: f64, a1: f64, a2: f64);
    fn close_path(&mut self);
    fn clear_path(&mut self);

    // Painting
    fn stroke(&mut self);
    fn stroke_preserve(&mut self);
    fn fill(&mut self);
    fn fill_preserve(&mut self);
    fn clip_rectangle(&mut self, x: f64, y: f64, w: f64, h: f64);

    // Text
    fn select_font_face(&mut self, slant: Slant, weight: Weight, family: &str);
    fn set_font_size(&mut self, size: f64);
    /// Draw `text` anchored at `(x, y)`, rotated by `rotate` radians.
    fn show_text(&mut self, rotate: f64, x: f64, y: f64, pos: TextPosition, text: &str);
    /// Box of `text` at the current font size, anchored at the origin.
    fn text_extents(&self, text: &str) -> Rectangle;

    /// Flush pending output. Surfaces that draw eagerly do nothing.
    fn flush(&mut self) {}
}
