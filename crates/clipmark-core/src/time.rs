//! Time helpers: frame rates, step rounding and timestamp formatting.
//!
//! Clip times are plain `f64` seconds. Precision is controlled by rounding
//! to fixed multiples rather than by exact arithmetic, because the values
//! have to agree with what the encoder computes from the same numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Round half up (towards positive infinity), the rounding every geometry
/// and descriptor calculation in the engine uses.
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Clamp `value` into `[min, max]`, preferring `min` when the range is empty.
///
/// Unlike [`f64::clamp`] this never panics, which the geometry operators rely
/// on when a rectangle is already at its minimum size.
#[inline]
pub fn clamp_number(value: f64, min: f64, max: f64) -> f64 {
    min.max(value.min(max))
}

/// Round a value to the nearest `multiple`, then to `precision` decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rounder {
    pub multiple: f64,
    pub precision: u32,
}

impl Rounder {
    pub const fn new(multiple: f64, precision: u32) -> Self {
        Self {
            multiple,
            precision,
        }
    }

    /// Apply the rounding.
    pub fn round(&self, value: f64) -> f64 {
        let stepped = if self.multiple > 0.0 {
            (value / self.multiple).round() * self.multiple
        } else {
            value
        };
        let scale = 10f64.powi(self.precision as i32);
        (stepped * scale).round() / scale
    }

    /// Speed values snap to 0.05 steps.
    pub const SPEED: Self = Self::new(0.05, 2);
    /// Time values snap to microseconds.
    pub const TIME: Self = Self::new(1e-6, 6);
}

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame in seconds.
    #[inline]
    pub fn frame_duration(self) -> f64 {
        self.denominator as f64 / self.numerator as f64
    }

    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// Format seconds as `HH:MM:SS.mmm`. Hours wrap at 24, milliseconds truncate.
pub fn format_hhmmss(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).trunc() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = (total_secs / 3600) % 24;
    format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
}

/// Like [`format_hhmmss`] with leading zero `00:` groups removed.
pub fn format_hhmmss_trimmed(seconds: f64) -> String {
    let full = format_hhmmss(seconds);
    let mut rest = full.as_str();
    while let Some(stripped) = rest.strip_prefix("00:") {
        rest = stripped;
    }
    rest.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(1.49), 1.0);
    }

    #[test]
    fn test_clamp_number_empty_range_prefers_min() {
        assert_eq!(clamp_number(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_number(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_number(5.0, 3.0, 1.0), 3.0);
    }

    #[test]
    fn test_speed_rounder() {
        assert_eq!(Rounder::SPEED.round(0.87), 0.85);
        assert_eq!(Rounder::SPEED.round(0.88), 0.9);
        assert_eq!(Rounder::SPEED.round(1.0), 1.0);
    }

    #[test]
    fn test_time_rounder() {
        assert_eq!(Rounder::TIME.round(1.234_567_89), 1.234_568);
    }

    #[test]
    fn test_frame_rate_29_97() {
        let rate = FrameRate::FPS_29_97;
        assert!((rate.to_fps_f64() - 29.97).abs() < 0.001);
        assert!((rate.frame_duration() - 1001.0 / 30000.0).abs() < 1e-12);
        assert_eq!(rate.to_string(), "29.970 fps");
        assert_eq!(FrameRate::FPS_30.to_string(), "30 fps");
    }

    #[test]
    fn test_format_hhmmss() {
        assert_eq!(format_hhmmss(3723.25), "01:02:03.250");
        assert_eq!(format_hhmmss_trimmed(65.5), "01:05.500");
        assert_eq!(format_hhmmss_trimmed(3.0), "03.000");
        assert_eq!(format_hhmmss_trimmed(3723.25), "01:02:03.250");
    }
}
