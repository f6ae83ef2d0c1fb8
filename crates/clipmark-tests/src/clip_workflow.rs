//! Integration tests for clip editing.
//!
//! Exercises marker pairs end to end: boundary moves over both maps,
//! speed edits with duration refresh, and undo/redo through a session.

use clipmark_core::{ClipError, EngineConfig, Resolution};
use clipmark_timeline::{
    compute_output_duration, ClipSession, ClipState, GlobalSettings, MarkerPair, SectionCursor,
    SectionMode, SpeedMap, SpeedPoint,
};
use uuid::Uuid;

use crate::init_tracing;

// ── Helpers ────────────────────────────────────────────────────

fn session_with_pair(start: f64, end: f64) -> (ClipSession, Uuid) {
    let mut session =
        ClipSession::new(EngineConfig::default(), GlobalSettings::for_video("vid", false));
    let id = session.add_marker_pair(start, end).unwrap();
    (session, id)
}

fn assert_maps_span_clip(state: &ClipState) {
    assert_eq!(state.speed_map.start(), state.start);
    assert_eq!(state.speed_map.end(), state.end);
    assert_eq!(state.crop_map.start(), state.start);
    assert_eq!(state.crop_map.end(), state.end);
}

// ── Duration ───────────────────────────────────────────────────

#[test]
fn constant_speed_holds_one_frame() {
    let map = SpeedMap::constant(0.0, 2.01, 1.0).unwrap();
    let duration = compute_output_duration(&map, 30.0).unwrap();
    let expected = (2.01_f64 * 30.0).round() / 30.0 + 1.0 / 30.0;
    assert!((duration - expected).abs() < 1e-3, "{duration} vs {expected}");
}

#[test]
fn slower_sections_lengthen_the_clip() {
    let (mut session, id) = session_with_pair(0.0, 4.0);
    let before = session.get(id).unwrap().output_duration();

    session
        .edit(id, |state, cfg| {
            state.insert_speed_point(2.0, 0.5, cfg)?;
            state.insert_speed_point(3.0, 0.5, cfg)
        })
        .unwrap();

    let pair = session.get(id).unwrap();
    assert!(pair.output_duration() > before);
    assert_eq!(
        pair.output_duration(),
        compute_output_duration(&pair.state().speed_map, pair.fps()).unwrap()
    );
}

#[test]
fn zero_fps_is_rejected() {
    let map = SpeedMap::constant(0.0, 1.0, 1.0).unwrap();
    assert!(compute_output_duration(&map, 0.0).is_err());
    let (mut session, _) = session_with_pair(0.0, 1.0);
    assert!(session.set_fps(f64::NAN).is_err());
}

// ── Boundary moves ─────────────────────────────────────────────

#[test]
fn stretch_then_shrink_static_clip_round_trips() {
    init_tracing();
    let (mut session, id) = session_with_pair(1.0, 3.0);
    session
        .edit(id, |state, cfg| state.set_crop_point(0, "100:100:640:360", cfg))
        .unwrap();
    let original = session.get(id).unwrap().state().clone();

    session.edit(id, |state, cfg| state.move_end(5.0, cfg)).unwrap();
    session.edit(id, |state, cfg| state.move_start(0.5, cfg)).unwrap();
    assert_maps_span_clip(session.get(id).unwrap().state());

    session.edit(id, |state, cfg| state.move_end(3.0, cfg)).unwrap();
    session.edit(id, |state, cfg| state.move_start(1.0, cfg)).unwrap();
    assert_eq!(session.get(id).unwrap().state(), &original);
}

#[test]
fn stretch_keeps_dynamic_section_shape() {
    let (mut session, id) = session_with_pair(0.0, 2.0);
    session
        .edit(id, |state, cfg| state.set_speed_point(1, 0.5, cfg))
        .unwrap();
    session.edit(id, |state, cfg| state.move_end(3.0, cfg)).unwrap();

    let map = &session.get(id).unwrap().state().speed_map;
    assert_eq!(
        map.points(),
        &[
            SpeedPoint::new(0.0, 1.0),
            SpeedPoint::new(2.0, 0.5),
            SpeedPoint::new(3.0, 0.5)
        ]
    );
}

#[test]
fn shrink_interpolates_new_boundary() {
    let (mut session, id) = session_with_pair(0.0, 2.0);
    session
        .edit(id, |state, cfg| state.set_speed_point(1, 0.5, cfg))
        .unwrap();
    session.edit(id, |state, cfg| state.move_end(1.0, cfg)).unwrap();

    let state = session.get(id).unwrap().state();
    assert_eq!(state.end, 1.0);
    assert_eq!(state.speed_map.last(), &SpeedPoint::new(1.0, 0.75));
    assert_maps_span_clip(state);
}

#[test]
fn crossing_boundaries_is_refused() {
    let (mut session, id) = session_with_pair(1.0, 2.0);
    let err = session
        .edit(id, |state, cfg| state.move_start(2.0, cfg))
        .unwrap_err();
    assert!(matches!(err, ClipError::InvalidBoundary(_)));
    assert_eq!(session.get(id).unwrap().state().start, 1.0);
}

// ── Points ─────────────────────────────────────────────────────

#[test]
fn inserted_point_is_found_by_lookup() {
    let (mut session, id) = session_with_pair(0.0, 10.0);
    for t in [7.5, 2.5, 5.0] {
        let index = session
            .edit(id, |state, cfg| state.insert_speed_point(t, 0.5, cfg))
            .unwrap();
        let map = &session.get(id).unwrap().state().speed_map;
        assert_eq!(map.lookup(t), (index, index));
    }
    let map = &session.get(id).unwrap().state().speed_map;
    assert!(map.points().windows(2).all(|w| w[0].x < w[1].x));
}

#[test]
fn boundary_points_survive_any_delete() {
    let (mut session, id) = session_with_pair(0.0, 4.0);
    session
        .edit(id, |state, cfg| {
            state.insert_crop_point(1.0, cfg)?;
            state.insert_crop_point(2.0, cfg)?;
            state.insert_crop_point(3.0, cfg)
        })
        .unwrap();

    let mut cursor = SectionCursor::new(3, SectionMode::End);
    for _ in 0..10 {
        let _ = session.edit(id, |state, _| {
            let last = state.crop_map.len() - 1;
            state.delete_crop_point(last, &mut cursor)
        });
        let _ = session.edit(id, |state, _| state.delete_crop_point(0, &mut cursor));
        let _ = session.edit(id, |state, _| state.delete_crop_point(1, &mut cursor));
    }

    let map = &session.get(id).unwrap().state().crop_map;
    assert_eq!(map.len(), 2);
    assert_eq!((map.start(), map.end()), (0.0, 4.0));
    assert_eq!(cursor.section(map.len()), (0, 1));
}

// ── History ────────────────────────────────────────────────────

#[test]
fn undo_branch_discards_redo() {
    let config = EngineConfig::default();
    let state = ClipState::new(0.0, 2.0, 1.0, "0:0:iw:ih", Resolution::HD_1080).unwrap();
    let mut pair = MarkerPair::new(state, &config).unwrap();

    pair.edit(|s| s.move_end(3.0, &config)).unwrap();
    pair.edit(|s| s.move_end(4.0, &config)).unwrap();
    assert!(pair.undo());
    pair.edit(|s| s.move_end(5.0, &config)).unwrap();

    assert!(!pair.redo());
    assert_eq!(pair.state().end, 5.0);
    assert!(pair.undo());
    assert_eq!(pair.state().end, 3.0);
    assert!(pair.undo());
    assert_eq!(pair.state().end, 2.0);
    assert!(!pair.undo());
}

#[test]
fn history_is_bounded_by_config() {
    let config = EngineConfig {
        history_capacity: 3,
        ..EngineConfig::default()
    };
    let state = ClipState::new(0.0, 1.0, 1.0, "0:0:iw:ih", Resolution::HD_1080).unwrap();
    let mut pair = MarkerPair::new(state, &config).unwrap();
    for end in [2.0, 3.0, 4.0, 5.0] {
        pair.edit(|s| s.move_end(end, &config)).unwrap();
    }

    assert_eq!(pair.history().len(), 3);
    let mut undone = 0;
    while pair.undo() {
        undone += 1;
    }
    assert_eq!(undone, 2);
    assert_eq!(pair.state().end, 3.0);
}

#[test]
fn undo_restores_output_duration() {
    let (mut session, id) = session_with_pair(0.0, 2.01);
    let original = session.get(id).unwrap().output_duration();
    session.update_all_speeds(0.5).unwrap();
    assert!(session.get(id).unwrap().output_duration() > original);

    let pair = session.get_mut(id).unwrap();
    assert!(pair.undo());
    assert_eq!(pair.output_duration(), original);
    assert_eq!(pair.state().speed, 1.0);
}

#[test]
fn unknown_marker_pair_is_an_error() {
    let (mut session, _) = session_with_pair(0.0, 1.0);
    let result = session.edit(Uuid::new_v4(), |state, cfg| {
        state.set_speed(0.5, cfg);
        Ok(())
    });
    assert!(matches!(result, Err(ClipError::InvalidParameter(_))));
}
