//! Engine configuration.
//!
//! Every knob has a default in [`crate::defaults`]; a JSON document only
//! needs to mention the fields it changes.

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{ClipError, Result};
use crate::geometry::{Crop, Resolution};
use crate::time::{clamp_number, Rounder};

/// Minimum crop dimensions, carried by value by every [`crate::Crop`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropLimits {
    min_w: f64,
    min_h: f64,
    /// When false the minimums collapse to zero.
    pub constrain_min_dimensions: bool,
}

impl CropLimits {
    pub fn new(min_w: f64, min_h: f64) -> Self {
        Self {
            min_w: min_w.max(0.0),
            min_h: min_h.max(0.0),
            constrain_min_dimensions: true,
        }
    }

    /// Limits that scale with the working resolution: the base size applies
    /// at 1080 lines and grows or shrinks with the smaller dimension.
    pub fn for_resolution(res: Resolution, base_min_size: f64) -> Self {
        let multiplier = res.width.min(res.height) as f64 / 1080.0;
        let min = (base_min_size * multiplier).round();
        Self::new(min, min)
    }

    /// Limits with no minimum size at all.
    pub fn unconstrained() -> Self {
        Self {
            constrain_min_dimensions: false,
            ..Self::default()
        }
    }

    #[inline]
    pub fn min_w(&self) -> f64 {
        if self.constrain_min_dimensions {
            self.min_w
        } else {
            0.0
        }
    }

    #[inline]
    pub fn min_h(&self) -> f64 {
        if self.constrain_min_dimensions {
            self.min_h
        } else {
            0.0
        }
    }
}

impl Default for CropLimits {
    fn default() -> Self {
        Self::new(defaults::MIN_CROP_SIZE, defaults::MIN_CROP_SIZE)
    }
}

/// Tunables for the clip engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Clip-level undo/redo depth.
    pub history_capacity: usize,
    /// Depth of the per-rectangle "apply previous" stack.
    pub crop_history_capacity: usize,
    /// Minimum crop side at a 1080-line working resolution.
    pub base_min_crop_size: f64,
    pub constrain_min_dimensions: bool,
    /// Frame rate assumed by the duration integrator when none is given.
    pub default_fps: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub speed_rounding: Rounder,
    pub time_rounding: Rounder,
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config.
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)
            .map_err(|e| ClipError::Serialization(format!("Invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(ClipError::parameter("history_capacity must be at least 1"));
        }
        if !(self.default_fps > 0.0) {
            return Err(ClipError::parameter("default_fps must be positive"));
        }
        if !(self.min_speed > 0.0) || self.min_speed > self.max_speed {
            return Err(ClipError::parameter(format!(
                "invalid speed bounds {}..={}",
                self.min_speed, self.max_speed
            )));
        }
        Ok(())
    }

    /// Crop limits for a working resolution under this config.
    pub fn crop_limits(&self, res: Resolution) -> CropLimits {
        let mut limits = CropLimits::for_resolution(res, self.base_min_crop_size);
        limits.constrain_min_dimensions = self.constrain_min_dimensions;
        limits
    }

    /// Parse a crop for `res`, clamped to this config's limits and carrying
    /// a local history of `crop_history_capacity` entries.
    pub fn crop(&self, descriptor: &str, res: Resolution) -> Result<Crop> {
        let crop = Crop::from_descriptor(descriptor, res, self.crop_limits(res))?;
        Ok(crop.with_history_capacity(self.crop_history_capacity))
    }

    /// Clamp a speed into the configured bounds and snap it to the speed step.
    pub fn normalize_speed(&self, speed: f64) -> f64 {
        clamp_number(
            self.speed_rounding.round(speed),
            self.min_speed,
            self.max_speed,
        )
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: defaults::HISTORY_CAPACITY,
            crop_history_capacity: defaults::CROP_HISTORY_CAPACITY,
            base_min_crop_size: defaults::BASE_MIN_CROP_SIZE,
            constrain_min_dimensions: true,
            default_fps: defaults::FPS,
            min_speed: defaults::MIN_SPEED,
            max_speed: defaults::MAX_SPEED,
            speed_rounding: Rounder::SPEED,
            time_rounding: Rounder::TIME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_scale_with_resolution() {
        let hd = CropLimits::for_resolution(Resolution::new(1920, 1080), 25.0);
        assert_eq!(hd.min_w(), 25.0);
        let small = CropLimits::for_resolution(Resolution::new(1280, 720), 25.0);
        assert_eq!(small.min_h(), 17.0);
        let uhd = CropLimits::for_resolution(Resolution::new(3840, 2160), 25.0);
        assert_eq!(uhd.min_w(), 50.0);
    }

    #[test]
    fn test_unconstrained_limits() {
        let limits = CropLimits::unconstrained();
        assert_eq!(limits.min_w(), 0.0);
        assert_eq!(limits.min_h(), 0.0);
    }

    #[test]
    fn test_partial_json_config() {
        let config = EngineConfig::from_json(r#"{ "history_capacity": 5 }"#).unwrap();
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.default_fps, defaults::FPS);
        assert_eq!(config.speed_rounding, Rounder::SPEED);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(EngineConfig::from_json(r#"{ "history_capacity": 0 }"#).is_err());
        assert!(EngineConfig::from_json(r#"{ "min_speed": 3.0 }"#).is_err());
        assert!(EngineConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_crop_uses_configured_history() {
        let config = EngineConfig {
            crop_history_capacity: 1,
            ..EngineConfig::default()
        };
        let mut crop = config.crop("0:0:iw:ih", Resolution::HD_1080).unwrap();
        crop.push_history(Some("0:0:100:100"));
        crop.push_history(Some("10:0:100:100"));
        assert_eq!(crop.pop_history().as_deref(), Some("10:0:100:100"));
        assert_eq!(crop.pop_history(), None);
        assert_eq!(crop.to_descriptor(), "10:0:100:100");

        let tiny = config.crop("0:0:1:1", Resolution::HD_1080).unwrap();
        assert_eq!((tiny.w(), tiny.h()), (25.0, 25.0));
    }

    #[test]
    fn test_normalize_speed() {
        let config = EngineConfig::default();
        assert_eq!(config.normalize_speed(0.01), 0.05);
        assert_eq!(config.normalize_speed(7.0), 2.0);
        assert_eq!(config.normalize_speed(0.73), 0.75);
    }
}
