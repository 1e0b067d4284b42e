//! Error type shared by every fallible operation in the crate.
//!
//! All failures are local and synchronous: nothing here is transient, so
//! callers never need to retry. A failed operation leaves the state it was
//! called on untouched.

use thiserror::Error;

/// Errors raised by matrices, coordinates, viewports and the backend registry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The matrix has a (numerically) zero determinant.
    #[error("matrix is not invertible (determinant {det})")]
    NotInvertible { det: f64 },

    /// Empty or reversed range, or a non-positive bound on a log axis.
    #[error("invalid range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// The two viewports do not draw on the same backend surface.
    #[error("viewports do not share a backend surface")]
    IncompatibleBackend,

    #[error("unknown coordinate system '{0}'")]
    UnknownCoordinateName(String),

    #[error("no backend registered under '{0}'")]
    UnknownBackend(String),

    #[error("invalid backend option '{0}'")]
    BackendOption(String),
}

/// Result alias defaulting to the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = Error::InvalidRange { min: 2.0, max: 1.0 };
        assert_eq!(e.to_string(), "invalid range [2, 1]");
        let e = Error::UnknownCoordinateName("pixels".into());
        assert_eq!(e.to_string(), "unknown coordinate system 'pixels'");
    }
}
