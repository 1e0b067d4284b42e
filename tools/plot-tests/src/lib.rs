// Copyright 2025. Drawing test catalog for the axiplot core.
//
// Each test draws one small plot into a fresh root viewport and returns
// the sub-viewports it drew into, which the harness keeps alive until it
// has drained the root. A test fails when it reports an error itself or
// when any drained instruction does.

use std::f64::consts::PI;

use axiplot::{
    Axes, BackendHandle, Color, CoordName, Error, GridSync, Mark, Path, Rectangle, Registry,
    Result, Scalar, TextPosition, Viewport,
};

// ============================================================================
// Catalog
// ============================================================================

/// A named drawing test.
pub struct PlotTest {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn(&Viewport) -> Result<Vec<Viewport>>,
}

static CATALOG: &[PlotTest] = &[
    PlotTest {
        name: "lines",
        description: "sine polyline auto-fitted in data coordinates",
        run: lines,
    },
    PlotTest {
        name: "marks",
        description: "every mark kind on a diagonal",
        run: marks,
    },
    PlotTest {
        name: "text",
        description: "text anchored at the nine positions",
        run: text,
    },
    PlotTest {
        name: "grid",
        description: "3x2 grid with x ranges shared per column",
        run: grid,
    },
    PlotTest {
        name: "borders",
        description: "title and axis borders around a center plot",
        run: borders,
    },
    PlotTest {
        name: "sync",
        description: "two plots sharing both ranges",
        run: sync,
    },
    PlotTest {
        name: "log",
        description: "logarithmic y axis",
        run: log,
    },
    PlotTest {
        name: "ortho",
        description: "circle in orthonormal coordinates",
        run: ortho,
    },
    PlotTest {
        name: "clip",
        description: "clipped fill inside save/restore",
        run: clip,
    },
];

pub fn catalog() -> &'static [PlotTest] {
    CATALOG
}

pub fn find(name: &str) -> Option<&'static PlotTest> {
    CATALOG.iter().find(|t| t.name == name)
}

// ============================================================================
// Running
// ============================================================================

/// Backend selection from the command line: `NAME[:OPT,...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendChoice {
    pub name: String,
    pub options: Vec<String>,
}

impl BackendChoice {
    pub fn parse(s: &str) -> BackendChoice {
        match s.split_once(':') {
            Some((name, opts)) => BackendChoice {
                name: name.to_string(),
                options: opts
                    .split(',')
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            None => BackendChoice {
                name: s.to_string(),
                options: Vec::new(),
            },
        }
    }

    pub fn make(&self, registry: &Registry) -> Result<BackendHandle> {
        registry.make(&self.name, &self.options)
    }
}

/// Result of one test on one backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed { instructions: usize },
    Failed(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Draw `test` on a fresh root viewport over `backend` and drain it.
pub fn run_test(test: &PlotTest, backend: BackendHandle) -> Outcome {
    let vp = Viewport::new(backend);
    let _children = match (test.run)(&vp) {
        Ok(children) => children,
        Err(e) => {
            vp.clear_instructions();
            return Outcome::Failed(e.to_string());
        }
    };
    let drain = vp.do_instructions();
    if drain.failed > 0 {
        Outcome::Failed(format!("{} instruction(s) failed", drain.failed))
    } else {
        Outcome::Passed {
            instructions: drain.executed,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

fn frame(vp: &Viewport) -> Result<()> {
    let mut p = Path::new();
    p.rectangle(0.0, 0.0, 1.0, 1.0);
    vp.stroke(CoordName::Graph, &p, false)
}

fn lines(vp: &Viewport) -> Result<Vec<Viewport>> {
    let points: Vec<(f64, f64)> = (0..=100)
        .map(|i| {
            let x = i as f64 * 2.0 * PI / 100.0;
            (x, x.sin())
        })
        .collect();
    frame(vp)?;
    vp.set_color(Color::BLUE);
    vp.set_line_width(Scalar::Relative(0.005));
    vp.stroke(CoordName::Data, &Path::polyline(&points), true)?;
    Ok(Vec::new())
}

fn marks(vp: &Viewport) -> Result<Vec<Viewport>> {
    frame(vp)?;
    vp.set_mark_size(Scalar::Relative(0.03));
    for (i, name) in [".", "o", "+", "x", "s"].iter().enumerate() {
        let v = i as f64;
        vp.mark(v, v, Mark::from_name(name))?;
    }
    Ok(Vec::new())
}

fn text(vp: &Viewport) -> Result<Vec<Viewport>> {
    use TextPosition::*;
    vp.set_font_size(Scalar::Relative(0.04));
    let positions = [
        (TopLeft, 0.1, 0.9),
        (Top, 0.5, 0.9),
        (TopRight, 0.9, 0.9),
        (Left, 0.1, 0.5),
        (Center, 0.5, 0.5),
        (Right, 0.9, 0.5),
        (BottomLeft, 0.1, 0.1),
        (Bottom, 0.5, 0.1),
        (BottomRight, 0.9, 0.1),
    ];
    for (pos, x, y) in positions {
        vp.show_text(CoordName::Graph, x, y, 0.0, pos, &format!("{pos:?}"));
    }
    Ok(Vec::new())
}

fn grid(vp: &Viewport) -> Result<Vec<Viewport>> {
    let sync = GridSync {
        columns: Axes::X,
        ..GridSync::default()
    };
    let cells = vp.layout_grid(3, 2, sync, None)?;
    for (i, cell) in cells.iter().enumerate() {
        frame(cell)?;
        let k = (i + 1) as f64;
        cell.stroke(
            CoordName::Data,
            &Path::polyline(&[(0.0, 0.0), (k, k * k)]),
            true,
        )?;
    }
    Ok(cells)
}

fn borders(vp: &Viewport) -> Result<Vec<Viewport>> {
    let b = vp.layout_borders(30.0, 20.0, 40.0, 0.0, None)?;
    b.north
        .show_text(CoordName::Graph, 0.5, 0.5, 0.0, TextPosition::Center, "Title");
    b.west
        .show_text(CoordName::Graph, 0.5, 0.5, PI / 2.0, TextPosition::Center, "y");
    b.south
        .show_text(CoordName::Graph, 0.5, 0.5, 0.0, TextPosition::Center, "x");
    frame(&b.center)?;
    b.center.mark(1.0, 2.0, Mark::Circle)?;
    b.center.mark(3.0, 1.0, Mark::Circle)?;
    Ok(vec![b.north, b.south, b.west, b.east, b.center])
}

fn sync(vp: &Viewport) -> Result<Vec<Viewport>> {
    let cols = vp.layout_columns(2, false, None)?;
    let (left, right) = (&cols[0], &cols[1]);
    right.sync_range(left, Axes::BOTH)?;
    left.stroke(CoordName::Data, &Path::polyline(&[(0.0, 0.0), (4.0, 2.0)]), true)?;
    right.stroke(CoordName::Data, &Path::polyline(&[(-4.0, 1.0), (0.0, 3.0)]), true)?;
    frame(left)?;
    frame(right)?;
    Ok(cols)
}

fn log(vp: &Viewport) -> Result<Vec<Viewport>> {
    vp.ylog(true)?;
    let points: Vec<(f64, f64)> = (0..=6).map(|i| (i as f64, 10f64.powi(i))).collect();
    frame(vp)?;
    vp.stroke(CoordName::Data, &Path::polyline(&points), true)?;
    match vp.mark(1.0, 0.0, Mark::Cross) {
        Err(Error::InvalidRange { .. }) => Ok(Vec::new()),
        Err(e) => Err(e),
        Ok(()) => Err(Error::InvalidRange { min: 0.0, max: 0.0 }),
    }
}

fn ortho(vp: &Viewport) -> Result<Vec<Viewport>> {
    let mut p = Path::new();
    let n = 64;
    for i in 0..=n {
        let a = i as f64 * 2.0 * PI / n as f64;
        p.line_to(0.5 + 0.4 * a.cos(), 0.5 + 0.4 * a.sin());
    }
    p.close();
    vp.set_color(Color::RED);
    vp.stroke(CoordName::Orthonormal, &p, false)?;
    Ok(Vec::new())
}

fn clip(vp: &Viewport) -> Result<Vec<Viewport>> {
    let mut p = Path::new();
    p.rectangle(0.0, 0.0, 1.0, 1.0);
    vp.save();
    vp.clip_rectangle(CoordName::Graph, Rectangle::new(0.25, 0.25, 0.5, 0.5));
    vp.set_color(Color::GREEN.with_opacity(0.5));
    vp.fill(CoordName::Graph, &p, false)?;
    vp.restore();
    frame(vp)?;
    Ok(Vec::new())
}
