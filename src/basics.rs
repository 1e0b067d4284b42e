//! Foundation types shared by every module: rectangles, float comparison,
//! and angle helpers.

pub const PI: f64 = std::f64::consts::PI;

/// Convert degrees to radians.
#[inline]
pub fn deg2rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Convert radians to degrees.
#[inline]
pub fn rad2deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

// ============================================================================
// Float comparison
// ============================================================================

/// Compare two floats with an epsilon scaled to the binary exponent of the
/// larger one. Zero has exponent 0, so comparisons against zero are
/// absolute.
///
/// Values of opposite sign only compare equal when both are within
/// `epsilon` of zero.
pub fn is_equal_eps(v1: f64, v2: f64, epsilon: f64) -> bool {
    if (v1 < 0.0) != (v2 < 0.0) {
        return v1.abs() < epsilon && v2.abs() < epsilon;
    }
    let max_exp = exponent(v1).max(exponent(v2));
    let scale = 2.0_f64.powi(-max_exp);
    (v1 * scale - v2 * scale).abs() < epsilon
}

/// Binary exponent `e` such that `x = m * 2^e` with `0.5 <= |m| < 1`.
#[inline]
fn exponent(x: f64) -> i32 {
    if x == 0.0 || !x.is_finite() {
        return 0;
    }
    ((x.to_bits() >> 52) & 0x7FF) as i32 - 1022
}

// ============================================================================
// Rectangle
// ============================================================================

/// A rectangle given by a reference corner `(x, y)` and a signed extent
/// `(w, h)`.
///
/// The corner is usually the lower-left one, but nothing requires `w` or
/// `h` to be positive; [`Rectangle::normalized`] flips negative extents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning two opposite corners, normalized.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            w: (x2 - x1).abs(),
            h: (y2 - y1).abs(),
        }
    }

    /// The unit square `[0, 1]²`.
    pub fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn x1(&self) -> f64 {
        self.x.min(self.x + self.w)
    }

    pub fn y1(&self) -> f64 {
        self.y.min(self.y + self.h)
    }

    pub fn x2(&self) -> f64 {
        self.x.max(self.x + self.w)
    }

    pub fn y2(&self) -> f64 {
        self.y.max(self.y + self.h)
    }

    /// Same area with non-negative extents.
    pub fn normalized(&self) -> Self {
        Self::from_corners(self.x, self.y, self.x + self.w, self.y + self.h)
    }

    pub fn area(&self) -> f64 {
        (self.w * self.h).abs()
    }

    /// Returns `true` if the rectangle encloses no area.
    pub fn is_empty(&self) -> bool {
        self.w == 0.0 || self.h == 0.0
    }

    /// Returns `true` if the point (x, y) is inside the rectangle
    /// (borders included).
    pub fn hit_test(&self, x: f64, y: f64) -> bool {
        x >= self.x1() && x <= self.x2() && y >= self.y1() && y <= self.y2()
    }

    /// Bounding box of both rectangles.
    pub fn union(&self, r: &Rectangle) -> Rectangle {
        Rectangle::from_corners(
            self.x1().min(r.x1()),
            self.y1().min(r.y1()),
            self.x2().max(r.x2()),
            self.y2().max(r.y2()),
        )
    }

    /// Overlap of both rectangles, or `None` when they are disjoint.
    /// Rectangles that only touch along an edge yield an empty rectangle.
    pub fn intersection(&self, r: &Rectangle) -> Option<Rectangle> {
        let x1 = self.x1().max(r.x1());
        let y1 = self.y1().max(r.y1());
        let x2 = self.x2().min(r.x2());
        let y2 = self.y2().min(r.y2());
        if x1 <= x2 && y1 <= y2 {
            Some(Rectangle::from_corners(x1, y1, x2, y2))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deg_rad() {
        assert!((deg2rad(180.0) - PI).abs() < 1e-12);
        assert!((rad2deg(PI / 2.0) - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_is_equal_eps() {
        assert!(is_equal_eps(1.0, 1.0 + 1e-15, 1e-14));
        assert!(!is_equal_eps(1.0, 1.001, 1e-14));
        assert!(is_equal_eps(1e10, 1e10 + 1e-5, 1e-14));
        assert!(!is_equal_eps(1e-3, -1e-3, 1e-14));
        assert!(is_equal_eps(0.0, -0.0, 1e-14));
    }

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rectangle::from_corners(10.0, 5.0, 2.0, 1.0);
        assert_eq!(r, Rectangle::new(2.0, 1.0, 8.0, 4.0));
    }

    #[test]
    fn test_negative_extent() {
        let r = Rectangle::new(10.0, 10.0, -4.0, -2.0);
        assert_eq!(r.x1(), 6.0);
        assert_eq!(r.y2(), 10.0);
        assert_eq!(r.normalized(), Rectangle::new(6.0, 8.0, 4.0, 2.0));
        assert_eq!(r.area(), 8.0);
    }

    #[test]
    fn test_union_intersection() {
        let a = Rectangle::new(0.0, 0.0, 2.0, 2.0);
        let b = Rectangle::new(1.0, 1.0, 2.0, 2.0);
        assert_eq!(a.union(&b), Rectangle::new(0.0, 0.0, 3.0, 3.0));
        assert_eq!(a.intersection(&b), Some(Rectangle::new(1.0, 1.0, 1.0, 1.0)));

        let c = Rectangle::new(2.0, 0.0, 1.0, 2.0);
        let touch = a.intersection(&c).unwrap();
        assert_eq!(touch.area(), 0.0);
        assert!(a.intersection(&Rectangle::new(5.0, 5.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn test_hit_test() {
        let r = Rectangle::unit();
        assert!(r.hit_test(0.5, 0.5));
        assert!(r.hit_test(1.0, 0.0));
        assert!(!r.hit_test(1.5, 0.5));
    }
}
