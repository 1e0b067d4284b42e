//! In-memory backend that records every primitive call.
//!
//! Useful as a test double, for replay comparisons, and as the built-in
//! `recording` entry of the [`Registry`](crate::registry::Registry). The
//! backend tracks the graphics state the contract exposes back to callers
//! (transform, line width, save/restore stack), so code that reads state
//! behaves as it would against a real surface.

use crate::backend::{Backend, LineCap, LineJoin, Slant, TextPosition, Weight};
use crate::basics::Rectangle;
use crate::color::Color;
use crate::matrix::Matrix;

/// Ratio of glyph advance to font size used for text metrics.
pub const CHAR_WIDTH_RATIO: f64 = 0.6;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    SetColor(Color),
    SetLineWidth(f64),
    SetLineCap(LineCap),
    SetLineJoin(LineJoin),
    SetDash(f64, Vec<f64>),
    Save,
    Restore,
    SetMatrix(Matrix),
    MoveTo(f64, f64),
    LineTo(f64, f64),
    CurveTo(f64, f64, f64, f64, f64, f64),
    Rectangle(f64, f64, f64, f64),
    Arc(f64, f64, f64, f64, f64),
    ClosePath,
    ClearPath,
    Stroke,
    StrokePreserve,
    Fill,
    FillPreserve,
    ClipRectangle(f64, f64, f64, f64),
    SelectFontFace(Slant, Weight, String),
    SetFontSize(f64),
    ShowText {
        rotate: f64,
        x: f64,
        y: f64,
        pos: TextPosition,
        text: String,
    },
}

impl Primitive {
    /// `true` for calls that put ink on the surface.
    pub fn is_paint(&self) -> bool {
        matches!(
            self,
            Primitive::Stroke
                | Primitive::StrokePreserve
                | Primitive::Fill
                | Primitive::FillPreserve
                | Primitive::ShowText { .. }
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct State {
    matrix: Matrix,
    line_width: f64,
    font_size: f64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            matrix: Matrix::identity(),
            line_width: 1.0,
            font_size: 10.0,
        }
    }
}

/// Backend that keeps a log of [`Primitive`]s instead of drawing.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    width: f64,
    height: f64,
    state: State,
    stack: Vec<State>,
    log: Vec<Primitive>,
}

impl RecordingBackend {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            state: State::default(),
            stack: Vec::new(),
            log: Vec::new(),
        }
    }

    /// Change the surface size, as a window resize would.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.log
    }

    /// Hand over the log, leaving it empty.
    pub fn take(&mut self) -> Vec<Primitive> {
        std::mem::take(&mut self.log)
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }

    /// Number of painting calls recorded so far.
    pub fn paint_count(&self) -> usize {
        self.log.iter().filter(|p| p.is_paint()).count()
    }

    /// Current depth of the save/restore stack.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    fn push(&mut self, p: Primitive) {
        self.log.push(p);
    }
}

impl Backend for RecordingBackend {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn set_color(&mut self, color: Color) {
        self.push(Primitive::SetColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
        self.push(Primitive::SetLineWidth(width));
    }

    fn line_width(&self) -> f64 {
        self.state.line_width
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.push(Primitive::SetLineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.push(Primitive::SetLineJoin(join));
    }

    fn set_dash(&mut self, offset: f64, dashes: &[f64]) {
        self.push(Primitive::SetDash(offset, dashes.to_vec()));
    }

    fn save(&mut self) {
        self.stack.push(self.state);
        self.push(Primitive::Save);
    }

    fn restore(&mut self) {
        // An unmatched restore is a no-op, as on most surfaces.
        if let Some(s) = self.stack.pop() {
            self.state = s;
        }
        self.push(Primitive::Restore);
    }

    fn get_matrix(&self) -> Matrix {
        self.state.matrix
    }

    fn set_matrix(&mut self, m: &Matrix) {
        self.state.matrix = *m;
        self.push(Primitive::SetMatrix(*m));
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push(Primitive::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(Primitive::LineTo(x, y));
    }

    fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.push(Primitive::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    fn rectangle(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(Primitive::Rectangle(x, y, w, h));
    }

    fn arc(&mut self, x: f64, y: f64, r: f64, a1: f64, a2: f64) {
        self.push(Primitive::Arc(x, y, r, a1, a2));
    }

    fn close_path(&mut self) {
        self.push(Primitive::ClosePath);
    }

    fn clear_path(&mut self) {
        self.push(Primitive::ClearPath);
    }

    fn stroke(&mut self) {
        self.push(Primitive::Stroke);
    }

    fn stroke_preserve(&mut self) {
        self.push(Primitive::StrokePreserve);
    }

    fn fill(&mut self) {
        self.push(Primitive::Fill);
    }

    fn fill_preserve(&mut self) {
        self.push(Primitive::FillPreserve);
    }

    fn clip_rectangle(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.push(Primitive::ClipRectangle(x, y, w, h));
    }

    fn select_font_face(&mut self, slant: Slant, weight: Weight, family: &str) {
        self.push(Primitive::SelectFontFace(slant, weight, family.to_string()));
    }

    fn set_font_size(&mut self, size: f64) {
        self.state.font_size = size;
        self.push(Primitive::SetFontSize(size));
    }

    fn show_text(&mut self, rotate: f64, x: f64, y: f64, pos: TextPosition, text: &str) {
        self.push(Primitive::ShowText {
            rotate,
            x,
            y,
            pos,
            text: text.to_string(),
        });
    }

    fn text_extents(&self, text: &str) -> Rectangle {
        let size = self.state.font_size;
        let w = CHAR_WIDTH_RATIO * size * text.chars().count() as f64;
        Rectangle::new(0.0, 0.0, w, size)
    }
}
