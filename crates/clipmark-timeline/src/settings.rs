//! Encode settings and per-clip overrides.
//!
//! Every layer is a [`SettingsLayer`] whose fields are all optional; `None`
//! means "inherit". Layers are combined with [`SettingsLayer::merge`] and
//! turned into concrete values with [`SettingsLayer::resolve`].

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Special looping applied to an output clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    None,
    /// Forward then reverse (ping-pong).
    FwRev,
    /// Cross-fade the end into the start.
    Fade,
}

/// Target frame rate policy for motion interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MinterpMode {
    #[default]
    Numeric,
    None,
    MaxSpeed,
    #[serde(rename = "VideoFPS")]
    VideoFps,
    MaxSpeedx2,
    #[serde(rename = "VideoFPSx2")]
    VideoFpsx2,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Denoise {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub luma_spatial: Option<u32>,
    #[serde(default)]
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStabilization {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shakiness: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<f64>,
    #[serde(default)]
    pub desc: String,
}

/// One layer of optional settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encode_speed: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crf: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_max_bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_pass: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denoise: Option<Denoise>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_stabilization: Option<VideoStabilization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_stabilization_dynamic_zoom: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_speed_maps: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minterp_mode: Option<MinterpMode>,
    #[serde(rename = "minterpFPS", skip_serializing_if = "Option::is_none")]
    pub minterp_fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#loop: Option<LoopMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_duration: Option<f64>,
}

/// Fully resolved settings for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub title_prefix: String,
    pub gamma: f64,
    /// `None` lets the encoder pick from the source bitrate.
    pub encode_speed: Option<u8>,
    pub crf: Option<u8>,
    pub target_max_bitrate: Option<u32>,
    pub two_pass: bool,
    pub denoise: Denoise,
    pub audio: bool,
    pub video_stabilization: VideoStabilization,
    pub video_stabilization_dynamic_zoom: bool,
    pub enable_speed_maps: bool,
    pub minterp_mode: MinterpMode,
    pub minterp_fps: Option<u32>,
    pub loop_mode: LoopMode,
    pub fade_duration: f64,
}

pub const DEFAULT_GAMMA: f64 = 1.0;
pub const DEFAULT_FADE_DURATION: f64 = 0.7;
pub const MIN_FADE_DURATION: f64 = 0.1;
/// Longest fade as a fraction of the output clip.
pub const MAX_FADE_FRACTION: f64 = 0.4;

impl SettingsLayer {
    /// `child` wins field by field; unset fields fall through to `parent`.
    pub fn merge(child: &SettingsLayer, parent: &SettingsLayer) -> SettingsLayer {
        fn pick<T: Clone>(child: &Option<T>, parent: &Option<T>) -> Option<T> {
            child.clone().or_else(|| parent.clone())
        }
        SettingsLayer {
            title_prefix: pick(&child.title_prefix, &parent.title_prefix),
            gamma: pick(&child.gamma, &parent.gamma),
            encode_speed: pick(&child.encode_speed, &parent.encode_speed),
            crf: pick(&child.crf, &parent.crf),
            target_max_bitrate: pick(&child.target_max_bitrate, &parent.target_max_bitrate),
            two_pass: pick(&child.two_pass, &parent.two_pass),
            denoise: pick(&child.denoise, &parent.denoise),
            audio: pick(&child.audio, &parent.audio),
            video_stabilization: pick(&child.video_stabilization, &parent.video_stabilization),
            video_stabilization_dynamic_zoom: pick(
                &child.video_stabilization_dynamic_zoom,
                &parent.video_stabilization_dynamic_zoom,
            ),
            enable_speed_maps: pick(&child.enable_speed_maps, &parent.enable_speed_maps),
            minterp_mode: pick(&child.minterp_mode, &parent.minterp_mode),
            minterp_fps: pick(&child.minterp_fps, &parent.minterp_fps),
            r#loop: pick(&child.r#loop, &parent.r#loop),
            fade_duration: pick(&child.fade_duration, &parent.fade_duration),
        }
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        *self == SettingsLayer::default()
    }

    /// Fill unset fields with defaults.
    pub fn resolve(&self) -> EncodeSettings {
        let settings = EncodeSettings {
            title_prefix: self.title_prefix.clone().unwrap_or_default(),
            gamma: self.gamma.unwrap_or(DEFAULT_GAMMA),
            encode_speed: self.encode_speed,
            crf: self.crf,
            target_max_bitrate: self.target_max_bitrate,
            two_pass: self.two_pass.unwrap_or(false),
            denoise: self.denoise.clone().unwrap_or_default(),
            audio: self.audio.unwrap_or(false),
            video_stabilization: self.video_stabilization.clone().unwrap_or_default(),
            video_stabilization_dynamic_zoom: self.video_stabilization_dynamic_zoom.unwrap_or(false),
            enable_speed_maps: self.enable_speed_maps.unwrap_or(true),
            minterp_mode: self.minterp_mode.unwrap_or_default(),
            minterp_fps: self.minterp_fps,
            loop_mode: self.r#loop.unwrap_or_default(),
            fade_duration: self.fade_duration.unwrap_or(DEFAULT_FADE_DURATION),
        };
        trace!(
            loop_mode = ?settings.loop_mode,
            enable_speed_maps = settings.enable_speed_maps,
            "resolved encode settings"
        );
        settings
    }
}

impl EncodeSettings {
    /// Fade length actually usable for a clip of `output_duration` seconds.
    pub fn effective_fade_duration(&self, output_duration: f64) -> f64 {
        let max = output_duration * MAX_FADE_FRACTION;
        self.fade_duration.min(max).max(MIN_FADE_DURATION)
    }
}
