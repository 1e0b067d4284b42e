//! Named backend factories.
//!
//! There is no process-wide table: a program builds a [`Registry`], adds
//! what it can draw on, and hands it to whatever creates viewports.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::backend::BackendHandle;
use crate::error::{Error, Result};
use crate::recording::RecordingBackend;

/// Creates a backend from its option strings.
pub type Factory = fn(&[String]) -> Result<BackendHandle>;

/// Default surface size of the `recording` backend.
pub const DEFAULT_SIZE: (f64, f64) = (640.0, 480.0);

#[derive(Clone, Default)]
pub struct Registry {
    factories: BTreeMap<String, Factory>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `recording` backend.
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register("recording", make_recording);
        r
    }

    /// Add or replace the factory for `name`.
    pub fn register(&mut self, name: &str, factory: Factory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn make(&self, name: &str, options: &[String]) -> Result<BackendHandle> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownBackend(name.to_string()))?;
        factory(options)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

/// Parse a `WxH` surface size.
pub fn parse_size(s: &str) -> Result<(f64, f64)> {
    let bad = || Error::BackendOption(s.to_string());
    let (w, h) = s.split_once(['x', 'X']).ok_or_else(bad)?;
    let w: f64 = w.trim().parse().map_err(|_| bad())?;
    let h: f64 = h.trim().parse().map_err(|_| bad())?;
    if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
        return Err(bad());
    }
    Ok((w, h))
}

fn make_recording(options: &[String]) -> Result<BackendHandle> {
    let (w, h) = match options {
        [] => DEFAULT_SIZE,
        [size] => parse_size(size)?,
        [_, extra, ..] => return Err(Error::BackendOption(extra.clone())),
    };
    Ok(Rc::new(RefCell::new(RecordingBackend::new(w, h))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;

    #[test]
    fn test_defaults() {
        let r = Registry::with_defaults();
        assert_eq!(r.names(), ["recording"]);
        let b = r.make("recording", &[]).unwrap();
        assert_eq!((b.borrow().width(), b.borrow().height()), DEFAULT_SIZE);
    }

    #[test]
    fn test_size_option() {
        let r = Registry::with_defaults();
        let b = r.make("recording", &["320x200".to_string()]).unwrap();
        assert_eq!(b.borrow().width(), 320.0);
        assert_eq!(
            r.make("recording", &["wide".to_string()]).err(),
            Some(Error::BackendOption("wide".into()))
        );
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn test_unknown_backend() {
        let r = Registry::new();
        assert_eq!(
            r.make("svg", &[]).err(),
            Some(Error::UnknownBackend("svg".into()))
        );
    }

    #[test]
    fn test_register_custom() {
        fn tiny(_: &[String]) -> Result<BackendHandle> {
            Ok(Rc::new(RefCell::new(RecordingBackend::new(1.0, 1.0))))
        }
        let mut r = Registry::with_defaults();
        r.register("tiny", tiny);
        assert!(r.contains("tiny"));
        assert_eq!(r.names(), ["recording", "tiny"]);
    }
}
