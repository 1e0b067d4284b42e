//! Record/replay behaviour of viewports through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use axiplot::{
    Axes, Backend, BackendHandle, CoordName, Drain, Error, Mark, Matrix, Path, Primitive,
    RecordingBackend, TextPosition, Viewport,
};

fn surface(w: f64, h: f64) -> (Rc<RefCell<RecordingBackend>>, Viewport) {
    let backend = Rc::new(RefCell::new(RecordingBackend::new(w, h)));
    let handle: BackendHandle = backend.clone();
    (backend, Viewport::new(handle))
}

fn series() -> Path {
    Path::polyline(&[(-3.0, 10.0), (0.0, 40.0), (2.5, -7.0), (6.0, 12.0)])
}

#[test]
fn test_late_auto_fit_matches_preset_range() {
    let path = series();
    let r = path.extents().unwrap();

    let (late_backend, late) = surface(200.0, 100.0);
    late.stroke(CoordName::Data, &path, false).unwrap();
    late.mark(0.0, 40.0, Mark::Square).unwrap();
    late.auto_fit(r.x1(), r.y1(), r.x2(), r.y2()).unwrap();
    assert_eq!(late_backend.borrow().paint_count(), 0);
    late.do_instructions();

    let (preset_backend, preset) = surface(200.0, 100.0);
    preset.xrange(r.x1(), r.x2()).unwrap();
    preset.yrange(r.y1(), r.y2()).unwrap();
    preset.stroke(CoordName::Data, &path, false).unwrap();
    preset.mark(0.0, 40.0, Mark::Square).unwrap();
    preset.do_instructions();

    assert_eq!(late_backend.borrow().primitives(), preset_backend.borrow().primitives());
}

#[test]
fn test_fit_flag_folds_path_extents() {
    let (_, vp) = surface(100.0, 100.0);
    vp.stroke(CoordName::Data, &series(), true).unwrap();
    assert_eq!((vp.xmin(), vp.xmax()), (-3.0, 6.0));
    assert_eq!((vp.ymin(), vp.ymax()), (-7.0, 40.0));

    // Non-data coordinates never fit.
    vp.stroke(CoordName::Graph, &Path::polyline(&[(0.0, 0.0), (100.0, 100.0)]), true)
        .unwrap();
    assert_eq!(vp.xmax(), 6.0);
}

#[test]
fn test_drain_reports_and_continues() {
    let (backend, vp) = surface(100.0, 100.0);
    vp.ylog(true).unwrap();
    vp.yrange(1.0, 100.0).unwrap();
    vp.stroke(CoordName::Data, &Path::polyline(&[(0.0, 1.0), (1.0, 10.0)]), false)
        .unwrap();
    vp.stroke(CoordName::Data, &Path::polyline(&[(0.0, -1.0), (1.0, 10.0)]), false)
        .unwrap();
    vp.show_text(CoordName::Graph, 0.5, 0.5, 0.0, TextPosition::Center, "after");

    assert_eq!(vp.do_instructions(), Drain { executed: 2, failed: 1 });
    assert_eq!(backend.borrow().paint_count(), 2);
    assert_eq!(vp.pending(), 0);
    assert_eq!(backend.borrow().save_depth(), 0);
}

#[test]
fn test_log_axis_rejects_non_positive_fit() {
    let (_, vp) = surface(100.0, 100.0);
    vp.xlog(true).unwrap();
    assert!(matches!(vp.mark(0.0, 1.0, Mark::Dot), Err(Error::InvalidRange { .. })));
    assert_eq!(vp.pending(), 0);
}

#[test]
fn test_drained_transform_is_restored() {
    let (backend, vp) = surface(100.0, 100.0);
    backend.borrow_mut().set_matrix(&Matrix::make_scale(2.0, 2.0));
    vp.mark(0.5, 0.5, Mark::Plus).unwrap();
    vp.do_instructions();
    assert_eq!(backend.borrow().get_matrix(), Matrix::make_scale(2.0, 2.0));
    assert!(backend
        .borrow()
        .primitives()
        .contains(&Primitive::SetMatrix(Matrix::identity())));
}

#[test]
fn test_sync_range_then_desync() {
    let (_, root) = surface(200.0, 100.0);
    let cols = root.layout_columns(2, false, None).unwrap();
    let (v1, v2) = (&cols[0], &cols[1]);

    v1.sync_range(v2, Axes::BOTH).unwrap();
    v1.xrange(-1.0, 3.0).unwrap();
    assert_eq!((v2.xmin(), v2.xmax()), (-1.0, 3.0));

    v1.desync_range(Axes::BOTH);
    v2.xrange(10.0, 20.0).unwrap();
    assert_eq!((v1.xmin(), v1.xmax()), (-1.0, 3.0));
}

#[test]
fn test_sync_shares_auto_fit() {
    let (_, root) = surface(200.0, 100.0);
    let cols = root.layout_columns(2, false, None).unwrap();
    cols[1].sync_range(&cols[0], Axes::X).unwrap();
    cols[0].auto_fit(0.0, 0.0, 5.0, 1.0).unwrap();
    cols[1].auto_fit(-5.0, 0.0, 1.0, 9.0).unwrap();
    assert_eq!((cols[0].xmin(), cols[0].xmax()), (-5.0, 5.0));
    assert_eq!(cols[0].ymax(), 1.0);
    assert_eq!(cols[1].ymax(), 9.0);
}
