//! Coordinate systems as nodes of a transform dependency graph.
//!
//! Each [`Coordinate`] holds a [`Matrix`] relative to an optional parent
//! node. Edges only point from child to parent: a node never knows its
//! dependents, so any number of children can hang off a node and the graph
//! can grow at any time without registering listeners.
//!
//! # Lazy revalidation
//!
//! Every in-place mutation stamps the node with a fresh value from a
//! process-wide, strictly increasing counter. A node's *effective version*
//! is the largest stamp found on the path to its root; because a new stamp
//! is larger than every stamp handed out before it, the effective version
//! changes exactly when the node or one of its ancestors has been mutated.
//!
//! The composed to-device matrix is cached together with the pair
//! `(own stamp, parent effective version)` it was computed from. A query
//! walks up the chain comparing those pairs and only recomputes the links
//! whose inputs moved; nothing is ever pushed down to dependents.
//!
//! [`Monitor`]s are change detectors built on the same effective version.

use std::cell::RefCell;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::backend::Backend;
use crate::error::Result;
use crate::matrix::Matrix;

static STAMP: AtomicU64 = AtomicU64::new(1);

#[inline]
fn next_stamp() -> u64 {
    STAMP.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy)]
struct Cache {
    own: u64,
    parent: u64,
    effective: u64,
    to_device: Matrix,
}

struct Node {
    matrix: Matrix,
    parent: Option<Coordinate>,
    version: u64,
    cache: Option<Cache>,
}

/// Shared handle to a node of the coordinate graph.
///
/// Cloning the handle aliases the node; use [`Coordinate::copy`] for an
/// independent node. A child keeps its parent alive, so every ancestor of a
/// reachable node can still be queried.
#[derive(Clone)]
pub struct Coordinate(Rc<RefCell<Node>>);

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        f.debug_struct("Coordinate")
            .field("matrix", &node.matrix)
            .field("version", &node.version)
            .field("has_parent", &node.parent.is_some())
            .finish()
    }
}

impl Coordinate {
    // ====================================================================
    // Construction
    // ====================================================================

    fn from_node(matrix: Matrix, parent: Option<Coordinate>) -> Self {
        Coordinate(Rc::new(RefCell::new(Node {
            matrix,
            parent,
            version: next_stamp(),
            cache: None,
        })))
    }

    /// A root system: `matrix` maps it straight to device coordinates.
    pub fn make_root(matrix: Matrix) -> Self {
        Self::from_node(matrix, None)
    }

    /// A system identical to `parent` that can later be moved on its own.
    pub fn make_identity(parent: &Coordinate) -> Self {
        Self::from_node(Matrix::identity(), Some(parent.clone()))
    }

    pub fn make_translate(parent: &Coordinate, dx: f64, dy: f64) -> Self {
        Self::from_node(Matrix::make_translate(dx, dy), Some(parent.clone()))
    }

    pub fn make_scale(parent: &Coordinate, sx: f64, sy: f64) -> Self {
        Self::from_node(Matrix::make_scale(sx, sy), Some(parent.clone()))
    }

    pub fn make_rotate(parent: &Coordinate, angle: f64) -> Self {
        Self::from_node(Matrix::make_rotate(angle), Some(parent.clone()))
    }

    /// A system whose points map to `parent` through `matrix`.
    pub fn make_from_transform(parent: &Coordinate, matrix: Matrix) -> Self {
        Self::from_node(matrix, Some(parent.clone()))
    }

    /// Independent node with the same relative matrix and parent.
    /// Mutating the copy never affects `self` and vice versa.
    pub fn copy(&self) -> Self {
        let node = self.0.borrow();
        Self::from_node(node.matrix, node.parent.clone())
    }

    // ====================================================================
    // Mutation (bumps the local version)
    // ====================================================================

    fn mutate(&self, f: impl FnOnce(&mut Matrix)) {
        let mut node = self.0.borrow_mut();
        f(&mut node.matrix);
        node.version = next_stamp();
    }

    /// Translate before the current relative transform.
    pub fn translate(&self, dx: f64, dy: f64) {
        self.mutate(|m| {
            m.translate(dx, dy);
        });
    }

    /// Scale before the current relative transform.
    pub fn scale(&self, sx: f64, sy: f64) {
        self.mutate(|m| {
            m.scale(sx, sy);
        });
    }

    /// Rotate (radians) before the current relative transform.
    pub fn rotate(&self, angle: f64) {
        self.mutate(|m| {
            m.rotate(angle);
        });
    }

    /// Apply `matrix` before the current relative transform.
    pub fn transform(&self, matrix: &Matrix) {
        self.mutate(|m| {
            m.premultiply(matrix);
        });
    }

    /// Replace the relative transform.
    pub fn set_matrix(&self, matrix: Matrix) {
        self.mutate(|m| *m = matrix);
    }

    // ====================================================================
    // Queries
    // ====================================================================

    /// Transform relative to the parent.
    pub fn matrix(&self) -> Matrix {
        self.0.borrow().matrix
    }

    pub fn parent(&self) -> Option<Coordinate> {
        self.0.borrow().parent.clone()
    }

    /// Stamp of the last in-place mutation of this node.
    pub fn version(&self) -> u64 {
        self.0.borrow().version
    }

    /// `true` if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Coordinate) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Bring the cache up to date and return `(effective version,
    /// to-device matrix)`.
    fn refresh(&self) -> (u64, Matrix) {
        let parent = self.0.borrow().parent.clone();
        let (parent_version, parent_matrix) = match parent {
            Some(p) => p.refresh(),
            None => (0, Matrix::identity()),
        };
        let mut node = self.0.borrow_mut();
        let cache = match node.cache {
            Some(c) if c.own == node.version && c.parent == parent_version => c,
            _ => {
                trace!(
                    own = node.version,
                    parent = parent_version,
                    "recomputing composed coordinate matrix"
                );
                let c = Cache {
                    own: node.version,
                    parent: parent_version,
                    effective: node.version.max(parent_version),
                    to_device: Matrix::multiply(&node.matrix, &parent_matrix),
                };
                node.cache = Some(c);
                c
            }
        };
        (cache.effective, cache.to_device)
    }

    /// Version that changes whenever this node or any ancestor is mutated.
    pub fn effective_version(&self) -> u64 {
        self.refresh().0
    }

    /// Composed transform from this system to device coordinates.
    pub fn to_device_matrix(&self) -> Matrix {
        self.refresh().1
    }

    /// Map a point of this system to its parent.
    pub fn to_parent(&self, x: f64, y: f64) -> (f64, f64) {
        self.matrix().transform_point(x, y)
    }

    /// Map a point of the parent system to this one.
    pub fn from_parent(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        self.matrix().inv_transform_point(x, y)
    }

    pub fn to_device(&self, x: f64, y: f64) -> (f64, f64) {
        self.to_device_matrix().transform_point(x, y)
    }

    pub fn to_device_distance(&self, dx: f64, dy: f64) -> (f64, f64) {
        self.to_device_matrix().transform_distance(dx, dy)
    }

    /// Map a device point into this system.
    pub fn to_coord(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        self.to_device_matrix().inv_transform_point(x, y)
    }

    /// Map a device distance into this system.
    pub fn to_coord_distance(&self, dx: f64, dy: f64) -> Result<(f64, f64)> {
        self.to_device_matrix().inv_transform_distance(dx, dy)
    }

    // ====================================================================
    // Change detection
    // ====================================================================

    /// New change detector primed with the current effective version.
    pub fn monitor(&self) -> Monitor {
        Monitor {
            seen: self.effective_version(),
            coord: self.clone(),
        }
    }

    // ====================================================================
    // Backend transform slot
    // ====================================================================

    /// Install this system's to-device matrix as the backend transform and
    /// return the transform that was active before.
    ///
    /// The returned token must be handed back to [`Coordinate::restore`]
    /// before any sibling `use_on` on the same backend.
    pub fn use_on(&self, backend: &mut dyn Backend) -> Matrix {
        let previous = backend.get_matrix();
        backend.set_matrix(&self.to_device_matrix());
        previous
    }

    /// Reinstall a transform returned by [`Coordinate::use_on`].
    pub fn restore(backend: &mut dyn Backend, ctm: Matrix) {
        backend.set_matrix(&ctm);
    }

    /// Like [`Coordinate::use_on`], restoring the previous transform when
    /// the guard is dropped.
    pub fn scoped<'a>(&self, backend: &'a mut dyn Backend) -> ScopedTransform<'a> {
        let saved = self.use_on(backend);
        ScopedTransform { backend, saved }
    }
}

// ============================================================================
// Monitor
// ============================================================================

/// Change detector over one coordinate node.
///
/// Reports a change when the node, or any of its ancestors, was mutated
/// since the monitor was created or last [reset](Monitor::reset).
#[derive(Debug, Clone)]
pub struct Monitor {
    coord: Coordinate,
    seen: u64,
}

impl Monitor {
    pub fn changed(&self) -> bool {
        self.coord.effective_version() != self.seen
    }

    /// Accept the current state as seen.
    pub fn reset(&mut self) {
        self.seen = self.coord.effective_version();
    }

    /// [`changed`](Monitor::changed) followed by [`reset`](Monitor::reset).
    pub fn take_change(&mut self) -> bool {
        let now = self.coord.effective_version();
        let changed = now != self.seen;
        self.seen = now;
        changed
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coord
    }
}

// ============================================================================
// ScopedTransform
// ============================================================================

/// Guard returned by [`Coordinate::scoped`].
pub struct ScopedTransform<'a> {
    backend: &'a mut dyn Backend,
    saved: Matrix,
}

impl<'a> Deref for ScopedTransform<'a> {
    type Target = dyn Backend + 'a;
    fn deref(&self) -> &Self::Target {
        &*self.backend
    }
}

impl<'a> DerefMut for ScopedTransform<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.backend
    }
}

impl Drop for ScopedTransform<'_> {
    fn drop(&mut self) {
        Coordinate::restore(&mut *self.backend, self.saved);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-10;

    fn assert_point(p: (f64, f64), x: f64, y: f64) {
        assert!((p.0 - x).abs() < EPS && (p.1 - y).abs() < EPS, "{p:?} != ({x}, {y})");
    }

    #[test]
    fn test_root_maps_through_its_matrix() {
        let root = Coordinate::make_root(Matrix::make_scale(2.0, 3.0));
        assert_point(root.to_device(1.0, 1.0), 2.0, 3.0);
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_chain_composes_child_first() {
        let root = Coordinate::make_root(Matrix::make_translate(100.0, 0.0));
        let scaled = Coordinate::make_scale(&root, 2.0, 2.0);
        let moved = Coordinate::make_translate(&scaled, 1.0, 1.0);
        // (0,0) -> translate -> (1,1) -> scale -> (2,2) -> root -> (102,2)
        assert_point(moved.to_device(0.0, 0.0), 102.0, 2.0);
        assert_point(moved.to_parent(0.0, 0.0), 1.0, 1.0);
        assert_point(moved.to_device_distance(1.0, 0.0), 2.0, 0.0);
    }

    #[test]
    fn test_to_coord_inverts_to_device() {
        let root = Coordinate::make_root(Matrix::make_translate(5.0, 5.0));
        let c = Coordinate::make_rotate(&Coordinate::make_scale(&root, 2.0, 4.0), PI / 3.0);
        let (dx, dy) = c.to_device(1.5, -2.0);
        assert_point(c.to_coord(dx, dy).unwrap(), 1.5, -2.0);
        let (ddx, ddy) = c.to_device_distance(1.0, 1.0);
        assert_point(c.to_coord_distance(ddx, ddy).unwrap(), 1.0, 1.0);
        let (px, py) = c.to_parent(3.0, 4.0);
        assert_point(c.from_parent(px, py).unwrap(), 3.0, 4.0);
    }

    #[test]
    fn test_to_coord_on_degenerate_chain_fails() {
        let root = Coordinate::make_root(Matrix::identity());
        let flat = Coordinate::make_scale(&root, 0.0, 1.0);
        assert!(flat.to_coord(1.0, 1.0).is_err());
        assert!(flat.from_parent(1.0, 1.0).is_err());
    }

    #[test]
    fn test_parent_mutation_is_seen_by_children() {
        let root = Coordinate::make_root(Matrix::identity());
        let mid = Coordinate::make_identity(&root);
        let leaf = Coordinate::make_translate(&mid, 1.0, 0.0);
        assert_point(leaf.to_device(0.0, 0.0), 1.0, 0.0);

        mid.scale(10.0, 10.0);
        assert_point(leaf.to_device(0.0, 0.0), 10.0, 0.0);

        root.translate(0.0, 5.0);
        assert_point(leaf.to_device(0.0, 0.0), 10.0, 5.0);
    }

    #[test]
    fn test_mutation_bumps_version() {
        let root = Coordinate::make_root(Matrix::identity());
        let v0 = root.version();
        root.rotate(0.1);
        let v1 = root.version();
        assert!(v1 > v0);
        root.transform(&Matrix::make_scale(2.0, 2.0));
        assert!(root.version() > v1);
    }

    #[test]
    fn test_transform_applies_before_existing() {
        let root = Coordinate::make_root(Matrix::make_translate(10.0, 0.0));
        root.transform(&Matrix::make_scale(3.0, 3.0));
        assert_point(root.to_device(1.0, 0.0), 13.0, 0.0);
        root.set_matrix(Matrix::identity());
        assert_point(root.to_device(1.0, 0.0), 1.0, 0.0);
    }

    #[test]
    fn test_copy_is_independent() {
        let root = Coordinate::make_root(Matrix::identity());
        let a = Coordinate::make_translate(&root, 1.0, 2.0);
        let b = a.copy();
        assert!(!a.ptr_eq(&b));
        assert_point(b.to_device(0.0, 0.0), 1.0, 2.0);

        b.translate(10.0, 0.0);
        assert_point(a.to_device(0.0, 0.0), 1.0, 2.0);
        assert_point(b.to_device(0.0, 0.0), 11.0, 2.0);

        // Shared parent still propagates to both.
        root.scale(2.0, 2.0);
        assert_point(a.to_device(0.0, 0.0), 2.0, 4.0);
        assert_point(b.to_device(0.0, 0.0), 22.0, 4.0);
    }

    #[test]
    fn test_rebase_on_new_parent() {
        let old_root = Coordinate::make_root(Matrix::identity());
        let new_root = Coordinate::make_root(Matrix::make_translate(50.0, 0.0));
        let child = Coordinate::make_translate(&old_root, 1.0, 0.0);
        let rebased = Coordinate::make_from_transform(&new_root, child.matrix());
        let m = child.monitor();
        assert_point(rebased.to_device(0.0, 0.0), 51.0, 0.0);
        new_root.translate(1.0, 0.0);
        // The old chain is unaffected by the new parent's mutation.
        assert!(!m.changed());
        assert_point(rebased.to_device(0.0, 0.0), 52.0, 0.0);
    }

    #[test]
    fn test_monitor_reports_own_mutation_until_reset() {
        let root = Coordinate::make_root(Matrix::identity());
        let mut before = root.monitor();
        let mut also_before = root.monitor();
        assert!(!before.changed());

        root.translate(1.0, 1.0);
        let after = root.monitor();
        assert!(before.changed());
        assert!(also_before.take_change());
        assert!(!also_before.take_change());
        assert!(!after.changed());

        before.reset();
        assert!(!before.changed());
    }

    #[test]
    fn test_monitor_sees_ancestor_mutation() {
        let root = Coordinate::make_root(Matrix::identity());
        let a = Coordinate::make_identity(&root);
        let b = Coordinate::make_identity(&a);
        let c = Coordinate::make_identity(&b);
        let on_c = c.monitor();
        let on_b = b.monitor();
        let on_root = root.monitor();

        a.scale(2.0, 2.0);
        assert!(on_c.changed());
        assert!(on_b.changed());
        assert!(!on_root.changed());
    }

    #[test]
    fn test_sibling_mutation_is_not_a_change() {
        let root = Coordinate::make_root(Matrix::identity());
        let left = Coordinate::make_identity(&root);
        let right = Coordinate::make_identity(&root);
        let m = left.monitor();
        right.rotate(1.0);
        assert!(!m.changed());
        assert!(m.coordinate().ptr_eq(&left));
    }

    #[test]
    fn test_use_and_restore() {
        let mut backend = RecordingBackend::new(100.0, 100.0);
        let root = Coordinate::make_root(Matrix::make_scale(2.0, 2.0));
        let child = Coordinate::make_translate(&root, 3.0, 0.0);

        let outer = root.use_on(&mut backend);
        assert!(outer.is_identity(EPS));
        assert_eq!(backend.get_matrix(), Matrix::make_scale(2.0, 2.0));

        let inner = child.use_on(&mut backend);
        assert_eq!(backend.get_matrix(), child.to_device_matrix());
        Coordinate::restore(&mut backend, inner);
        assert_eq!(backend.get_matrix(), Matrix::make_scale(2.0, 2.0));
        Coordinate::restore(&mut backend, outer);
        assert!(backend.get_matrix().is_identity(EPS));
    }

    #[test]
    fn test_scoped_guard_restores_on_drop() {
        let mut backend = RecordingBackend::new(10.0, 10.0);
        let root = Coordinate::make_root(Matrix::make_translate(4.0, 4.0));
        {
            let mut guard = root.scoped(&mut backend);
            assert_eq!(guard.get_matrix(), Matrix::make_translate(4.0, 4.0));
            guard.move_to(0.0, 0.0);
        }
        assert!(backend.get_matrix().is_identity(EPS));
    }

    proptest! {
        #[test]
        fn identity_chain_is_identity(
            depth in 1usize..32,
            x in -1.0e6..1.0e6f64,
            y in -1.0e6..1.0e6f64,
        ) {
            let mut node = Coordinate::make_root(Matrix::identity());
            for _ in 0..depth {
                node = Coordinate::make_identity(&node);
            }
            prop_assert_eq!(node.to_device(x, y), (x, y));
        }

        #[test]
        fn any_ancestor_mutation_is_detected(depth in 1usize..16, pick in 0usize..16) {
            let mut chain = vec![Coordinate::make_root(Matrix::identity())];
            for _ in 0..depth {
                let next = Coordinate::make_identity(chain.last().unwrap());
                chain.push(next);
            }
            let leaf = chain.last().unwrap().clone();
            let m = leaf.monitor();
            chain[pick % chain.len()].translate(1.0, 0.0);
            prop_assert!(m.changed());
            prop_assert_eq!(leaf.to_device(0.0, 0.0), (1.0, 0.0));
        }
    }
}
