//! Integration tests for crop geometry and crop maps.

use clipmark_core::{Crop, CropLimits, CropRect, EngineConfig, Resolution};
use clipmark_timeline::{ClipSession, ClipState, GlobalSettings};
use uuid::Uuid;

use crate::init_tracing;

const RES: Resolution = Resolution::HD_1080;

fn limits() -> CropLimits {
    EngineConfig::default().crop_limits(RES)
}

fn zoom_pan_session(points: &[(f64, &str)]) -> (ClipSession, Uuid) {
    let mut session =
        ClipSession::new(EngineConfig::default(), GlobalSettings::for_video("vid", false));
    let (start, _) = points[0];
    let (end, _) = points[points.len() - 1];
    let id = session.add_marker_pair(start, end).unwrap();
    session
        .edit(id, |state, cfg| {
            state.toggle_zoom_pan();
            for &(t, _) in &points[1..points.len() - 1] {
                state.insert_crop_point(t, cfg)?;
            }
            for (index, &(_, crop)) in points.iter().enumerate() {
                state.crop_map.update_value(index, |p| p.crop = crop.to_string())?;
            }
            state.crop = state.crop_map.first().crop.clone();
            Ok(())
        })
        .unwrap();
    (session, id)
}

fn sizes(state: &ClipState) -> Vec<(f64, f64)> {
    state
        .crop_map
        .iter()
        .map(|p| {
            let r = CropRect::parse(&p.crop, RES).unwrap();
            (r.w, r.h)
        })
        .collect()
}

// ── Geometry ───────────────────────────────────────────────────

#[test]
fn full_frame_locked_corner_resize_keeps_ratio() {
    let mut crop = Crop::from_descriptor("0:0:1920:1080", RES, limits()).unwrap();
    let ratio = crop.w() / crop.h();
    crop.resize_se_aspect_ratio_locked(100.0, 50.0);

    let rect = CropRect::parse(&crop.to_descriptor(), RES).unwrap();
    assert_eq!((rect.x, rect.y), (0.0, 0.0));
    assert!((rect.w / rect.h - ratio).abs() <= 1.0 / rect.w.min(rect.h));
}

#[test]
fn locked_corner_resize_grows_both_axes() {
    let mut crop = Crop::from_descriptor("0:0:960:540", RES, limits()).unwrap();
    let applied = crop.resize_se_aspect_ratio_locked(100.0, 50.0);

    assert!(applied.dx > 0.0 && applied.dy > 0.0);
    assert_eq!((crop.x(), crop.y()), (0.0, 0.0));
    assert!((crop.w() / crop.h() - 16.0 / 9.0).abs() <= 1.0 / crop.h());
    assert!(crop.is_valid());
}

#[test]
fn symbolic_descriptor_survives_full_size() {
    let crop = Crop::from_descriptor("0:0:iw:ih", RES, limits()).unwrap();
    assert_eq!(crop.to_descriptor(), "0:0:1920:1080");
    assert_eq!(crop.to_symbolic_descriptor(), "0:0:iw:ih");

    let partial = Crop::from_descriptor("10:0:1910:ih", RES, limits()).unwrap();
    assert_eq!(partial.to_symbolic_descriptor(), "10:0:1910:ih");
}

// ── Crop maps on a clip ────────────────────────────────────────

#[test]
fn instant_ease_jumps_to_next_crop() {
    let (mut session, id) = zoom_pan_session(&[(0.0, "0:0:640:360"), (2.0, "200:0:640:360")]);
    let smooth = session.get(id).unwrap().state().crop_map.crop_at(1.0, RES).unwrap();
    assert!((smooth.x - 100.0).abs() < 1e-9);

    session
        .edit(id, |state, _| state.toggle_crop_ease_in(1))
        .unwrap();
    let map = &session.get(id).unwrap().state().crop_map;
    assert_eq!(map.crop_at(0.5, RES).unwrap().x, 200.0);
    assert_eq!(map.crop_at(0.0, RES).unwrap().x, 0.0);
}

#[test]
fn pan_only_shrink_keeps_one_size() {
    init_tracing();
    let mut session =
        ClipSession::new(EngineConfig::default(), GlobalSettings::for_video("vid", false));
    let id = session.add_marker_pair(0.0, 4.0).unwrap();
    session
        .edit(id, |state, cfg| {
            state.set_crop_point(0, "0:0:640:360", cfg)?;
            state.insert_crop_point(2.0, cfg)?;
            state.set_crop_point(1, "500:300:640:360", cfg)
        })
        .unwrap();

    session.edit(id, |state, cfg| state.move_end(3.0, cfg)).unwrap();

    let state = session.get(id).unwrap().state();
    assert_eq!(state.crop_map.len(), 3);
    assert_eq!(state.crop_map.end(), 3.0);
    assert!(sizes(state).iter().all(|&s| s == (640.0, 360.0)), "{:?}", sizes(state));
}

#[test]
fn aspect_ratio_applies_to_every_point() {
    let (mut session, id) = zoom_pan_session(&[
        (0.0, "0:0:640:360"),
        (1.0, "100:100:400:300"),
        (2.0, "1500:0:300:400"),
    ]);
    session
        .edit(id, |state, cfg| state.set_crop_aspect_ratio(1.0, None, cfg))
        .unwrap();

    let state = session.get(id).unwrap().state();
    assert_eq!(sizes(state), vec![(640.0, 640.0), (400.0, 400.0), (400.0, 400.0)]);
    for point in state.crop_map.iter() {
        let crop = Crop::from_descriptor(&point.crop, RES, limits()).unwrap();
        assert!(crop.is_valid());
    }
}

#[test]
fn crop_stats_track_variable_size() {
    let (session, id) = zoom_pan_session(&[(0.0, "0:0:400:200"), (2.0, "0:0:800:400")]);
    let map = &session.get(id).unwrap().state().crop_map;
    assert!(map.is_variable_size(RES).unwrap());

    let stats = map.size_stats(RES).unwrap();
    assert_eq!((stats.min_w, stats.min_h), (400.0, 200.0));
    assert_eq!((stats.max_w, stats.max_h), (800.0, 400.0));
    assert_eq!((stats.avg_w, stats.avg_h), (600.0, 300.0));
}

#[test]
fn inherit_copies_neighbour_crop() {
    let (mut session, id) = zoom_pan_session(&[
        (0.0, "0:0:400:300"),
        (1.0, "10:10:500:300"),
        (2.0, "20:20:600:300"),
    ]);
    session
        .edit(id, |state, _| state.inherit_crop_point(1, true))
        .unwrap();
    assert_eq!(
        session.get(id).unwrap().state().crop_map.points()[1].crop,
        "20:20:600:300"
    );
    session
        .edit(id, |state, _| state.inherit_crop_point(0, false))
        .unwrap_err();
}
