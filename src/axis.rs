//! Axis ranges and the auto-fit state shared through sync groups.

use crate::error::{Error, Result};

/// A closed interval `[min, max]` with `min < max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Range used when nothing was set or fitted.
    pub const DEFAULT: Range = Range { min: 0.0, max: 1.0 };
    /// Default on a logarithmic axis.
    pub const DEFAULT_LOG: Range = Range { min: 1.0, max: 10.0 };

    /// Validated range; fails unless both bounds are finite and
    /// `min < max`.
    pub fn new(min: f64, max: f64) -> Result<Range> {
        if min.is_finite() && max.is_finite() && min < max {
            Ok(Range { min, max })
        } else {
            Err(Error::InvalidRange { min, max })
        }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn center(&self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Same range in `log10` space. Both bounds must be positive.
    pub fn log10(&self) -> Result<Range> {
        if self.min <= 0.0 {
            return Err(Error::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        Range::new(self.min.log10(), self.max.log10())
    }
}

/// The value behind an x- or y-range sync cell: the current bounds and
/// whether new data may still widen them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    bounds: Option<(f64, f64)>,
    auto_fit: bool,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self {
            bounds: None,
            auto_fit: true,
        }
    }
}

impl AxisRange {
    /// Fix the range explicitly. Auto-fit is disabled until
    /// [`AxisRange::reset_auto_fit`].
    pub fn set(&mut self, range: Range) {
        self.bounds = Some((range.min, range.max));
        self.auto_fit = false;
    }

    /// Widen the bounds to include `[lo, hi]`; never shrinks. Does
    /// nothing while the range is fixed. Non-finite bounds fail and leave
    /// the range as it was.
    pub fn fit(&mut self, lo: f64, hi: f64) -> Result<()> {
        if !lo.is_finite() || !hi.is_finite() {
            return Err(Error::InvalidRange { min: lo, max: hi });
        }
        if !self.auto_fit {
            return Ok(());
        }
        let (lo, hi) = (lo.min(hi), lo.max(hi));
        self.bounds = Some(match self.bounds {
            None => (lo, hi),
            Some((min, max)) => (min.min(lo), max.max(hi)),
        });
        Ok(())
    }

    /// Forget all bounds and accept fitting again.
    pub fn reset_auto_fit(&mut self) {
        self.bounds = None;
        self.auto_fit = true;
    }

    pub fn is_auto_fit(&self) -> bool {
        self.auto_fit
    }

    /// Raw bounds, `None` before anything was set or fitted.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    /// Range to draw with. Defaults when empty; a single fitted value
    /// `v` widens to `[v - 0.5, v + 0.5]`, or `[v / 10, v * 10]` on a log
    /// axis.
    pub fn resolve(&self, log: bool) -> Result<Range> {
        let (min, max) = match self.bounds {
            None if log => return Ok(Range::DEFAULT_LOG),
            None => return Ok(Range::DEFAULT),
            Some(b) => b,
        };
        if log && min <= 0.0 {
            return Err(Error::InvalidRange { min, max });
        }
        if min == max {
            return if log {
                Range::new(min / 10.0, max * 10.0)
            } else {
                Range::new(min - 0.5, max + 0.5)
            };
        }
        Range::new(min, max)
    }
}
