//! Viewport drawing style: colour, line and font sizes, marks.
//!
//! Sizes are [`Scalar`]s so that a plot can be written once and look the
//! same at any output resolution: a relative size is a fraction of the
//! smaller side of the viewport, resolved when the instruction runs.

use std::f64::consts::PI;

use crate::backend::{Backend, LineCap, LineJoin};
use crate::color::Color;

/// A size in device units, or relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Absolute(f64),
    /// Fraction of `min(width, height)` of the viewport's device rectangle.
    Relative(f64),
}

impl Scalar {
    /// Device-unit value for a viewport whose smaller side is `reference`.
    pub fn resolve(self, reference: f64) -> f64 {
        match self {
            Scalar::Absolute(v) => v,
            Scalar::Relative(v) => v * reference,
        }
    }
}

/// Current style of a viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub color: Color,
    pub line_width: Scalar,
    pub font_size: Scalar,
    pub mark_size: Scalar,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// `(offset, pattern)`; an empty pattern draws solid lines.
    pub dash: (f64, Vec<f64>),
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            line_width: Scalar::Absolute(1.0),
            font_size: Scalar::Absolute(12.0),
            mark_size: Scalar::Absolute(7.0),
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            dash: (0.0, Vec::new()),
        }
    }
}

impl Style {
    /// Push the whole style to `backend`.
    pub fn apply(&self, backend: &mut dyn Backend, reference: f64) {
        backend.set_color(self.color);
        backend.set_line_width(self.line_width.resolve(reference));
        backend.set_line_cap(self.line_cap);
        backend.set_line_join(self.line_join);
        backend.set_dash(self.dash.0, &self.dash.1);
        backend.set_font_size(self.font_size.resolve(reference));
    }
}

// ============================================================================
// Marks
// ============================================================================

/// Symbol drawn at a data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mark {
    #[default]
    Dot,
    Circle,
    Plus,
    Cross,
    Square,
}

impl Mark {
    /// Mark for a one-character name: `.`, `o`, `+`, `x`, `s`.
    /// Anything else draws a dot.
    pub fn from_name(name: &str) -> Mark {
        match name {
            "o" => Mark::Circle,
            "+" => Mark::Plus,
            "x" => Mark::Cross,
            "s" => Mark::Square,
            _ => Mark::Dot,
        }
    }

    /// Draw the mark centred on device point `(x, y)`, `size` device
    /// units across.
    pub fn draw(self, backend: &mut dyn Backend, x: f64, y: f64, size: f64) {
        let r = size / 2.0;
        match self {
            Mark::Dot => {
                backend.arc(x, y, r, 0.0, 2.0 * PI);
                backend.fill();
            }
            Mark::Circle => {
                backend.arc(x, y, r, 0.0, 2.0 * PI);
                backend.stroke();
            }
            Mark::Plus => {
                backend.move_to(x - r, y);
                backend.line_to(x + r, y);
                backend.move_to(x, y - r);
                backend.line_to(x, y + r);
                backend.stroke();
            }
            Mark::Cross => {
                let d = r * std::f64::consts::FRAC_1_SQRT_2;
                backend.move_to(x - d, y - d);
                backend.line_to(x + d, y + d);
                backend.move_to(x - d, y + d);
                backend.line_to(x + d, y - d);
                backend.stroke();
            }
            Mark::Square => {
                backend.rectangle(x - r, y - r, size, size);
                backend.stroke();
            }
        }
    }
}
