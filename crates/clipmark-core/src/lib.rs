//! Clipmark Core - Foundation types for the clip engine
//!
//! This crate provides the primitives the timeline builds on:
//! - Crop geometry (Crop, CropRect, Resolution) and the descriptor codec
//! - Easing curves for point-map interpolation
//! - Time helpers (FrameRate, Rounder, half-up rounding)
//! - Engine configuration and error types

pub mod config;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod time;

pub use config::{CropLimits, EngineConfig};
pub use easing::{eased_value, Easing};
pub use error::{ClipError, Result};
pub use geometry::{multiply_descriptor, AppliedDelta, Crop, CropRect, Resolution};
pub use time::{
    clamp_number, format_hhmmss, format_hhmmss_trimmed, round_half_up, FrameRate, Rounder,
};

/// Engine-wide default values
pub mod defaults {
    /// Minimum crop side when no resolution scaling applies
    pub const MIN_CROP_SIZE: f64 = 20.0;

    /// Minimum crop side at a 1080-line working resolution
    pub const BASE_MIN_CROP_SIZE: f64 = 25.0;

    /// Clip-level undo/redo depth
    pub const HISTORY_CAPACITY: usize = 100;

    /// Depth of each crop's local history stack
    pub const CROP_HISTORY_CAPACITY: usize = 100;

    /// Frame rate assumed when the source rate is unknown
    pub const FPS: f64 = 30.0;

    pub const MIN_SPEED: f64 = 0.05;
    pub const MAX_SPEED: f64 = 2.0;

    /// Full-frame crop descriptor
    pub const FULL_CROP: &str = "0:0:iw:ih";
}
