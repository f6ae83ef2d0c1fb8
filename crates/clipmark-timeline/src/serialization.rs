//! Marker export format with versioning and migration.
//!
//! Uses JSON with a schema version field. Static speed and crop maps are left
//! out of the export and rebuilt from `speed`/`crop` on import.

use clipmark_core::{ClipError, EngineConfig, Resolution, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crop_map::CropMap;
use crate::marker_pair::{ClipState, MarkerPair};
use crate::session::{ClipSession, GlobalSettings};
use crate::settings::SettingsLayer;
use crate::speed_map::SpeedMap;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Versioned markers file: global settings plus numbered marker pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkersFile {
    /// Schema version for migration.
    pub version: u32,
    /// Application version that wrote this file.
    #[serde(default)]
    pub app_version: String,
    #[serde(flatten)]
    pub settings: GlobalSettings,
    /// Redundant with `cropRes`, kept for readers that want numbers.
    #[serde(default)]
    pub crop_res_width: u32,
    #[serde(default)]
    pub crop_res_height: u32,
    pub marker_pairs: Vec<MarkerPairRecord>,
}

/// One exported marker pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPairRecord {
    /// 1-based position in the session.
    #[serde(default)]
    pub number: usize,
    pub start: f64,
    pub end: f64,
    pub crop: String,
    pub speed: f64,
    #[serde(default, skip_serializing_if = "SettingsLayer::is_empty")]
    pub overrides: SettingsLayer,
    /// Present only when the speed varies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_map: Option<SpeedMap>,
    /// Present only when the crop varies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_map: Option<CropMap>,
    #[serde(default)]
    pub output_duration: f64,
    #[serde(default)]
    pub enable_zoom_pan: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_res: Option<Resolution>,
}

impl MarkerPairRecord {
    fn from_pair(number: usize, pair: &MarkerPair) -> Self {
        let state = pair.state();
        Self {
            number,
            start: state.start,
            end: state.end,
            crop: state.crop.clone(),
            speed: state.speed,
            overrides: pair.overrides.clone(),
            speed_map: state
                .speed_map
                .is_variable()
                .then(|| state.speed_map.clone()),
            crop_map: (!state.crop_map.is_static()).then(|| state.crop_map.clone()),
            output_duration: pair.output_duration(),
            enable_zoom_pan: state.enable_zoom_pan,
            crop_res: Some(state.crop_res),
        }
    }

    /// Rebuild the clip state, filling in omitted maps from `speed`/`crop`.
    pub fn to_state(&self, default_res: Resolution) -> Result<ClipState> {
        let speed_map = match &self.speed_map {
            Some(map) => map.clone(),
            None => SpeedMap::constant(self.start, self.end, self.speed)?,
        };
        let crop_map = match &self.crop_map {
            Some(map) => map.clone(),
            None => CropMap::constant(self.start, self.end, &self.crop)?,
        };
        let state = ClipState {
            start: self.start,
            end: self.end,
            speed: self.speed,
            speed_map,
            crop: self.crop.clone(),
            crop_map,
            enable_zoom_pan: self.enable_zoom_pan,
            crop_res: self.crop_res.unwrap_or(default_res),
        };
        state.validate()?;
        Ok(state)
    }
}

impl MarkersFile {
    /// Snapshot a session for export.
    pub fn from_session(session: &ClipSession) -> Self {
        let settings = session.settings.clone();
        Self {
            version: CURRENT_VERSION,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            crop_res_width: settings.crop_res.width,
            crop_res_height: settings.crop_res.height,
            settings,
            marker_pairs: session
                .marker_pairs()
                .iter()
                .enumerate()
                .map(|(index, pair)| MarkerPairRecord::from_pair(index + 1, pair))
                .collect(),
        }
    }

    /// Build a session from the file. Every pair starts with fresh history.
    pub fn into_session(self, config: EngineConfig) -> Result<ClipSession> {
        config.validate()?;
        let mut session = ClipSession::new(config, self.settings);
        let default_res = session.settings.crop_res;
        for record in &self.marker_pairs {
            let state = record.to_state(default_res)?;
            let mut pair = MarkerPair::new(state, session.config())?;
            pair.overrides = record.overrides.clone();
            session.push_marker_pair(pair);
        }
        debug!(pairs = session.len(), "imported markers");
        Ok(session)
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| ClipError::Serialization(format!("Failed to serialize markers: {}", e)))
    }

    /// Deserialize from JSON bytes, applying migrations if needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| ClipError::Serialization(format!("Invalid JSON: {}", e)))?;

        // Unversioned files carry the app version string here, if anything.
        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

        if version > CURRENT_VERSION {
            return Err(ClipError::Serialization(format!(
                "Markers file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;

        serde_json::from_value(migrated)
            .map_err(|e| ClipError::Serialization(format!("Failed to parse markers: {}", e)))
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 → v1: numeric schema version, `markers` renamed to `markerPairs`.
                let object = data.as_object_mut().ok_or_else(|| {
                    ClipError::Serialization("Markers file must be a JSON object".into())
                })?;
                if let Some(app_version) = object.remove("version") {
                    if let Some(s) = app_version.as_str() {
                        object.insert("appVersion".into(), s.into());
                    }
                }
                if !object.contains_key("markerPairs") {
                    let markers = object.remove("markers").ok_or_else(|| {
                        ClipError::Serialization(
                            "Could not find markers or markerPairs field".into(),
                        )
                    })?;
                    object.insert("markerPairs".into(), markers);
                }
                object.insert("version".into(), 1.into());
                debug!("migrated markers file from v0");
                version = 1;
            }
            _ => {
                return Err(ClipError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}
