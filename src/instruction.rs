//! Deferred drawing operations.
//!
//! Every recorded viewport call becomes an [`Instruction`]: a plain value
//! holding its arguments in the coordinate system they were given in.
//! Coordinates are resolved to device space only when the instruction is
//! executed, against whatever mapping the viewport has at that moment.

use crate::backend::{Backend, LineCap, LineJoin, Slant, TextPosition, Weight};
use crate::basics::Rectangle;
use crate::color::Color;
use crate::error::Result;
use crate::path::Path;
use crate::style::{Mark, Scalar, Style};
use crate::viewport::{CoordName, Mapping};

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    SetColor(Color),
    SetLineWidth(Scalar),
    SetFontSize(Scalar),
    SetMarkSize(Scalar),
    SetLineCap(LineCap),
    SetLineJoin(LineJoin),
    SetDash(f64, Vec<f64>),
    SelectFontFace(Slant, Weight, String),
    Stroke {
        coord: CoordName,
        path: Path,
    },
    Fill {
        coord: CoordName,
        path: Path,
    },
    ShowText {
        coord: CoordName,
        x: f64,
        y: f64,
        rotate: f64,
        pos: TextPosition,
        text: String,
    },
    /// Mark at a point in Data coordinates.
    Mark {
        x: f64,
        y: f64,
        mark: Mark,
    },
    ClipRectangle {
        coord: CoordName,
        rect: Rectangle,
    },
    Save,
    Restore,
}

/// What an instruction runs against.
pub(crate) struct Context<'a> {
    pub backend: &'a mut dyn Backend,
    pub style: &'a mut Style,
    pub saved: &'a mut Vec<Style>,
    pub mapping: &'a Mapping,
}

impl Instruction {
    /// `true` for instructions that put ink on the surface.
    pub fn is_drawing(&self) -> bool {
        matches!(
            self,
            Instruction::Stroke { .. }
                | Instruction::Fill { .. }
                | Instruction::ShowText { .. }
                | Instruction::Mark { .. }
        )
    }

    /// Run against `cx`. Nothing reaches the backend when a coordinate
    /// cannot be resolved.
    pub(crate) fn execute(&self, cx: &mut Context<'_>) -> Result<()> {
        let reference = cx.mapping.reference();
        match self {
            Instruction::SetColor(c) => {
                cx.style.color = *c;
                cx.backend.set_color(*c);
            }
            Instruction::SetLineWidth(s) => {
                cx.style.line_width = *s;
                cx.backend.set_line_width(s.resolve(reference));
            }
            Instruction::SetFontSize(s) => {
                cx.style.font_size = *s;
                cx.backend.set_font_size(s.resolve(reference));
            }
            Instruction::SetMarkSize(s) => cx.style.mark_size = *s,
            Instruction::SetLineCap(cap) => {
                cx.style.line_cap = *cap;
                cx.backend.set_line_cap(*cap);
            }
            Instruction::SetLineJoin(join) => {
                cx.style.line_join = *join;
                cx.backend.set_line_join(*join);
            }
            Instruction::SetDash(offset, dashes) => {
                cx.style.dash = (*offset, dashes.clone());
                cx.backend.set_dash(*offset, dashes);
            }
            Instruction::SelectFontFace(slant, weight, family) => {
                cx.backend.select_font_face(*slant, *weight, family);
            }
            Instruction::Stroke { coord, path } => {
                let device = path.try_map(|x, y| cx.mapping.to_device(*coord, x, y))?;
                cx.backend.clear_path();
                device.emit(cx.backend);
                cx.backend.stroke();
            }
            Instruction::Fill { coord, path } => {
                let device = path.try_map(|x, y| cx.mapping.to_device(*coord, x, y))?;
                cx.backend.clear_path();
                device.emit(cx.backend);
                cx.backend.fill();
            }
            Instruction::ShowText {
                coord,
                x,
                y,
                rotate,
                pos,
                text,
            } => {
                let (dx, dy) = cx.mapping.to_device(*coord, *x, *y)?;
                cx.backend.show_text(*rotate, dx, dy, *pos, text);
            }
            Instruction::Mark { x, y, mark } => {
                let (dx, dy) = cx.mapping.to_device(CoordName::Data, *x, *y)?;
                cx.backend.clear_path();
                mark.draw(cx.backend, dx, dy, cx.style.mark_size.resolve(reference));
            }
            Instruction::ClipRectangle { coord, rect } => {
                let (x1, y1) = cx.mapping.to_device(*coord, rect.x1(), rect.y1())?;
                let (x2, y2) = cx.mapping.to_device(*coord, rect.x2(), rect.y2())?;
                let r = Rectangle::from_corners(x1, y1, x2, y2);
                cx.backend.clip_rectangle(r.x, r.y, r.w, r.h);
            }
            Instruction::Save => {
                cx.saved.push(cx.style.clone());
                cx.backend.save();
            }
            Instruction::Restore => {
                if let Some(style) = cx.saved.pop() {
                    *cx.style = style;
                }
                cx.backend.restore();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::matrix::Matrix;
    use crate::recording::{Primitive, RecordingBackend};

    fn run(instr: &Instruction, mapping: &Mapping) -> (Result<()>, Style, Vec<Primitive>) {
        let mut b = RecordingBackend::new(200.0, 100.0);
        let mut style = Style::default();
        let mut saved = Vec::new();
        let r = instr.execute(&mut Context {
            backend: &mut b,
            style: &mut style,
            saved: &mut saved,
            mapping,
        });
        (r, style, b.take())
    }

    fn graph_mapping() -> Mapping {
        // Graph spans a 200x100 surface.
        Mapping::new(
            Matrix::identity(),
            Matrix::make_scale(200.0, 100.0),
            Ok(Matrix::make_scale(200.0, 100.0)),
            Matrix::make_scale(100.0, 100.0),
            (false, false),
            100.0,
        )
    }

    #[test]
    fn test_stroke_maps_vertices_at_execution() {
        let path = Path::polyline(&[(0.0, 0.0), (1.0, 1.0)]);
        let instr = Instruction::Stroke {
            coord: CoordName::Graph,
            path,
        };
        let (r, _, prims) = run(&instr, &graph_mapping());
        assert!(r.is_ok());
        assert_eq!(
            prims,
            vec![
                Primitive::ClearPath,
                Primitive::MoveTo(0.0, 0.0),
                Primitive::LineTo(200.0, 100.0),
                Primitive::Stroke,
            ]
        );
    }

    #[test]
    fn test_relative_line_width() {
        let (_, style, prims) = run(&Instruction::SetLineWidth(Scalar::Relative(0.05)), &graph_mapping());
        assert_eq!(style.line_width, Scalar::Relative(0.05));
        assert_eq!(prims, vec![Primitive::SetLineWidth(5.0)]);
    }

    #[test]
    fn test_failed_mapping_draws_nothing() {
        let mapping = Mapping::new(
            Matrix::identity(),
            Matrix::identity(),
            Err(Error::InvalidRange { min: -1.0, max: 1.0 }),
            Matrix::identity(),
            (true, false),
            1.0,
        );
        let instr = Instruction::Mark {
            x: 1.0,
            y: 1.0,
            mark: Mark::Dot,
        };
        let (r, _, prims) = run(&instr, &mapping);
        assert_eq!(r, Err(Error::InvalidRange { min: -1.0, max: 1.0 }));
        assert!(prims.is_empty());
    }

    #[test]
    fn test_clip_rectangle_in_graph() {
        let instr = Instruction::ClipRectangle {
            coord: CoordName::Graph,
            rect: Rectangle::new(0.5, 0.0, 0.5, 1.0),
        };
        let (_, _, prims) = run(&instr, &graph_mapping());
        assert_eq!(prims, vec![Primitive::ClipRectangle(100.0, 0.0, 100.0, 100.0)]);
    }

    #[test]
    fn test_is_drawing() {
        assert!(Instruction::Mark {
            x: 0.0,
            y: 0.0,
            mark: Mark::Plus
        }
        .is_drawing());
        assert!(!Instruction::Save.is_drawing());
    }
}
