//! Integration tests for exporting and re-importing a session.

use clipmark_core::{EngineConfig, Resolution};
use clipmark_timeline::{ClipSession, GlobalSettings, LoopMode, MarkersFile, CURRENT_VERSION};

use crate::init_tracing;

fn build_session() -> ClipSession {
    let mut session =
        ClipSession::new(EngineConfig::default(), GlobalSettings::for_video("abc123", false));
    session.settings.marker_pair_merge_list = "1-2".into();
    session.settings.encode.gamma = Some(1.1);

    let first = session.add_marker_pair(10.0, 12.0).unwrap();
    let second = session.add_marker_pair(20.0, 25.0).unwrap();
    session
        .edit(first, |state, cfg| state.insert_speed_point(11.0, 0.5, cfg))
        .unwrap();
    session
        .edit(second, |state, cfg| {
            state.toggle_zoom_pan();
            state.insert_crop_point(22.0, cfg)?;
            state.set_crop_point(1, "100:100:800:450", cfg)?;
            state.toggle_crop_ease_in(1)
        })
        .unwrap();
    session.get_mut(second).unwrap().overrides.r#loop = Some(LoopMode::FwRev);
    session
}

#[test]
fn export_import_preserves_clips() {
    init_tracing();
    let session = build_session();
    let bytes = MarkersFile::from_session(&session).to_json().unwrap();
    let restored = MarkersFile::from_json(&bytes)
        .unwrap()
        .into_session(EngineConfig::default())
        .unwrap();

    assert_eq!(restored.settings, session.settings);
    assert_eq!(restored.merge_list_summary(), session.merge_list_summary());
    for (a, b) in restored.marker_pairs().iter().zip(session.marker_pairs()) {
        assert_eq!(a.state(), b.state());
        assert_eq!(a.overrides, b.overrides);
        assert_eq!(a.output_duration(), b.output_duration());
    }

    let second = restored.marker_pairs()[1].id;
    let settings = restored.effective_settings(second).unwrap();
    assert_eq!(settings.loop_mode, LoopMode::FwRev);
    assert_eq!(settings.gamma, 1.1);
}

#[test]
fn exported_json_uses_camel_case_and_omits_static_maps() {
    let mut session = build_session();
    session.add_marker_pair(30.0, 31.0).unwrap();
    let bytes = MarkersFile::from_session(&session).to_json().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["version"], CURRENT_VERSION);
    assert_eq!(json["videoID"], "abc123");
    assert_eq!(json["titleSuffix"], "[abc123]");
    assert_eq!(json["markerPairMergeList"], "1-2");
    assert_eq!(json["gamma"], 1.1);

    let pairs = json["markerPairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 3);
    assert!(pairs[0].get("speedMap").is_some());
    assert!(pairs[0].get("cropMap").is_none());
    assert_eq!(pairs[1]["cropMap"][1]["easeIn"], "instant");
    assert!(pairs[2].get("speedMap").is_none());
    assert!(pairs[2].get("cropMap").is_none());
    assert!(pairs.iter().all(|p| p.get("moveHistory").is_none()));
    assert_eq!(pairs[2]["number"], 3);
}

#[test]
fn resolution_change_survives_export() {
    let mut session = build_session();
    session.set_crop_res(Resolution::new(960, 540)).unwrap();
    let bytes = MarkersFile::from_session(&session).to_json().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["cropRes"], "960x540");
    assert_eq!(json["cropResWidth"], 960);
    assert_eq!(json["markerPairs"][1]["cropMap"][1]["crop"], "50:50:400:225");

    let restored = MarkersFile::from_json(&bytes)
        .unwrap()
        .into_session(EngineConfig::default())
        .unwrap();
    assert_eq!(restored.settings.crop_res, Resolution::new(960, 540));
}

#[test]
fn shrunk_full_frame_pair_stays_static() {
    let mut session =
        ClipSession::new(EngineConfig::default(), GlobalSettings::for_video("abc123", false));
    let id = session.add_marker_pair(0.0, 4.0).unwrap();
    session.edit(id, |state, cfg| state.move_end(3.0, cfg)).unwrap();

    let state = session.get(id).unwrap().state();
    assert!(state.crop_map.is_static());
    assert!(state.crop_map.iter().all(|p| p.crop == "0:0:iw:ih"));

    assert_eq!(session.update_all_crops("10:10:500:500").unwrap(), 1);
    let state = session.get(id).unwrap().state();
    assert!(state.crop_map.iter().all(|p| p.crop == "10:10:500:500"));

    let bytes = MarkersFile::from_session(&session).to_json().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["markerPairs"][0].get("cropMap").is_none());
}
