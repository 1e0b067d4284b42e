//! Affine transformation matrix.
//!
//! 2D affine transforms used by every coordinate system: composition,
//! inversion, and point/distance/rectangle mapping.
//!
//! Two conventions matter here and everything in [`crate::coordinate`]
//! relies on them:
//!
//! - [`Matrix::multiply`]`(a, b)` applies `a` **first**, then `b`.
//! - The in-place [`Matrix::translate`], [`Matrix::scale`] and
//!   [`Matrix::rotate`] apply the new operation *before* the existing
//!   transform, like a graphics-state CTM.

use crate::basics::{is_equal_eps, Rectangle};
use crate::error::{Error, Result};

/// Epsilon for matrix comparisons.
pub const MATRIX_EPSILON: f64 = 1e-14;

/// 2D affine transformation matrix.
///
/// Represents
///
/// ```text
///   x' = xx*x + xy*y + x0
///   y' = yx*x + yy*y + y0
/// ```
///
/// `Matrix` is a plain `Copy` value; copies never alias.
#[derive(Debug, Clone, Copy)]
pub struct Matrix {
    pub xx: f64,
    pub yx: f64,
    pub xy: f64,
    pub yy: f64,
    pub x0: f64,
    pub y0: f64,
}

/// How [`Matrix::transform_rectangle`] treats the reference corner of a
/// rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectRef {
    /// The corner is an absolute position.
    Point,
    /// The corner is an offset; translation is ignored.
    Distance,
    /// The corner is kept as is, only the extent is mapped.
    Untransformed,
}

impl Matrix {
    // ====================================================================
    // Construction
    // ====================================================================

    /// Identity matrix.
    pub const fn identity() -> Self {
        Self {
            xx: 1.0,
            yx: 0.0,
            xy: 0.0,
            yy: 1.0,
            x0: 0.0,
            y0: 0.0,
        }
    }

    /// Custom matrix from six components.
    pub const fn new(xx: f64, yx: f64, xy: f64, yy: f64, x0: f64, y0: f64) -> Self {
        Self {
            xx,
            yx,
            xy,
            yy,
            x0,
            y0,
        }
    }

    /// Translation matrix.
    pub const fn make_translate(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    /// Non-uniform scaling matrix.
    pub const fn make_scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation matrix, angle in radians (counter-clockwise).
    pub fn make_rotate(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// Matrix sending the unit square `[0, 1]²` onto `r`.
    pub fn make_rectangle(r: &Rectangle) -> Self {
        Self::new(r.w, 0.0, 0.0, r.h, r.x, r.y)
    }

    // ====================================================================
    // Operations (mutate self)
    // ====================================================================

    /// Reset to identity.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::identity();
        self
    }

    /// Translate by `(dx, dy)` before applying the current transform.
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.x0 += self.xx * dx + self.xy * dy;
        self.y0 += self.yx * dx + self.yy * dy;
        self
    }

    /// Scale by `(sx, sy)` before applying the current transform.
    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.xx *= sx;
        self.yx *= sx;
        self.xy *= sy;
        self.yy *= sy;
        self
    }

    /// Rotate by `angle` radians before applying the current transform.
    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        let (s, c) = angle.sin_cos();
        let xx = self.xx * c + self.xy * s;
        let yx = self.yx * c + self.yy * s;
        self.xy = self.xy * c - self.xx * s;
        self.yy = self.yy * c - self.yx * s;
        self.xx = xx;
        self.yx = yx;
        self
    }

    /// Apply `m` after the current transform: `self = multiply(self, m)`.
    pub fn then(&mut self, m: &Matrix) -> &mut Self {
        *self = Self::multiply(self, m);
        self
    }

    /// Apply `m` before the current transform: `self = multiply(m, self)`.
    pub fn premultiply(&mut self, m: &Matrix) -> &mut Self {
        *self = Self::multiply(m, self);
        self
    }

    /// Composition that applies `a` first, then `b`.
    ///
    /// Note the argument order: `transform_point(multiply(a, b), p)` is
    /// `transform_point(b, transform_point(a, p))`. This is the reverse of
    /// the usual `B·A` notation for column vectors.
    pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
        Matrix {
            xx: b.xx * a.xx + b.xy * a.yx,
            yx: b.yx * a.xx + b.yy * a.yx,
            xy: b.xx * a.xy + b.xy * a.yy,
            yy: b.yx * a.xy + b.yy * a.yy,
            x0: b.xx * a.x0 + b.xy * a.y0 + b.x0,
            y0: b.yx * a.x0 + b.yy * a.y0 + b.y0,
        }
    }

    /// Inverse matrix. Fails with [`Error::NotInvertible`] when the
    /// determinant is zero or so small that its reciprocal overflows;
    /// `self` is never modified.
    pub fn invert(&self) -> Result<Matrix> {
        let det = self.determinant();
        let d = 1.0 / det;
        if det == 0.0 || !d.is_finite() {
            return Err(Error::NotInvertible { det });
        }
        Ok(Matrix {
            xx: self.yy * d,
            yx: -self.yx * d,
            xy: -self.xy * d,
            yy: self.xx * d,
            x0: (self.xy * self.y0 - self.yy * self.x0) * d,
            y0: (self.yx * self.x0 - self.xx * self.y0) * d,
        })
    }

    // ====================================================================
    // Transformations
    // ====================================================================

    /// Forward transform of a point.
    #[inline]
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.xx * x + self.xy * y + self.x0,
            self.yx * x + self.yy * y + self.y0,
        )
    }

    /// Forward transform of a distance vector (translation ignored).
    #[inline]
    pub fn transform_distance(&self, dx: f64, dy: f64) -> (f64, f64) {
        (self.xx * dx + self.xy * dy, self.yx * dx + self.yy * dy)
    }

    /// Inverse transform of a point.
    pub fn inv_transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(self.invert()?.transform_point(x, y))
    }

    /// Inverse transform of a distance vector.
    pub fn inv_transform_distance(&self, dx: f64, dy: f64) -> Result<(f64, f64)> {
        Ok(self.invert()?.transform_distance(dx, dy))
    }

    /// Axis-aligned bounding box of the four transformed corners of `r`.
    ///
    /// The extent `(w, h)` is always mapped as a distance; `reference`
    /// decides what happens to the corner `(r.x, r.y)`.
    pub fn transform_rectangle(&self, r: &Rectangle, reference: RectRef) -> Rectangle {
        let (x, y) = match reference {
            RectRef::Point => self.transform_point(r.x, r.y),
            RectRef::Distance => self.transform_distance(r.x, r.y),
            RectRef::Untransformed => (r.x, r.y),
        };
        let (wx, wy) = self.transform_distance(r.w, 0.0);
        let (hx, hy) = self.transform_distance(0.0, r.h);
        let xs = [x, x + wx, x + hx, x + wx + hx];
        let ys = [y, y + wy, y + hy, y + wy + hy];
        let fold = |v: &[f64; 4]| {
            v.iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
                    (lo.min(c), hi.max(c))
                })
        };
        let (x1, x2) = fold(&xs);
        let (y1, y2) = fold(&ys);
        Rectangle::new(x1, y1, x2 - x1, y2 - y1)
    }

    // ====================================================================
    // Auxiliary
    // ====================================================================

    /// Determinant of the linear part.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.xx * self.yy - self.xy * self.yx
    }

    /// Check if this is an identity matrix.
    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.is_equal(&Matrix::identity(), epsilon)
    }

    /// Check if two matrices are equal within epsilon.
    pub fn is_equal(&self, m: &Matrix, epsilon: f64) -> bool {
        is_equal_eps(self.xx, m.xx, epsilon)
            && is_equal_eps(self.yx, m.yx, epsilon)
            && is_equal_eps(self.xy, m.xy, epsilon)
            && is_equal_eps(self.yy, m.yy, epsilon)
            && is_equal_eps(self.x0, m.x0, epsilon)
            && is_equal_eps(self.y0, m.y0, epsilon)
    }

    /// Length of the images of the unit vectors along x and y.
    pub fn scaling_abs(&self) -> (f64, f64) {
        (self.xx.hypot(self.yx), self.xy.hypot(self.yy))
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other, MATRIX_EPSILON)
    }
}

/// `a * b` applies `a` first, then `b`, like [`Matrix::multiply`].
impl std::ops::Mul for Matrix {
    type Output = Matrix;
    fn mul(self, rhs: Matrix) -> Matrix {
        Matrix::multiply(&self, &rhs)
    }
}

impl std::ops::MulAssign for Matrix {
    fn mul_assign(&mut self, rhs: Matrix) {
        self.then(&rhs);
    }
}

// ============================================================================
// Tests
// ============================================================================
