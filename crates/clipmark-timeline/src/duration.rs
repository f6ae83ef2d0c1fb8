//! Output duration of a clip under a speed map.
//!
//! Speed is treated as linear in input time within each section, so the
//! output time of a section is the closed-form integral of `1 / speed`.
//! The first and last input frames are snapped to the frame grid the same
//! way the trim filter does, and the total is quantized to whole frames.

use tracing::warn;

use clipmark_core::{round_half_up, ClipError, Result};

use crate::speed_map::SpeedMap;

/// Tolerance under which a boundary is considered frame-exact.
const FRAME_EXACT_EPSILON: f64 = 1e-10;

/// Output duration in seconds of `speed_map` played at `fps`.
pub fn compute_output_duration(speed_map: &SpeedMap, fps: f64) -> Result<f64> {
    if !(fps > 0.0) || !fps.is_finite() {
        return Err(ClipError::parameter(format!("fps must be positive, got {}", fps)));
    }
    let frame_dur = 1.0 / fps;
    let points = speed_map.points();
    let sections = points.len() - 1;

    let map_start = points[0].x;
    // Offset of the first frame the trim actually includes.
    let start_offset = (map_start / frame_dur).ceil() * frame_dur - map_start;

    let mut output = 0.0;
    for sect in 0..sections {
        let (left, right) = (&points[sect], &points[sect + 1]);
        let (start_speed, end_speed) = (left.y, right.y);
        let speed_change = end_speed - start_speed;

        let sect_start = left.x - map_start - start_offset;
        let mut sect_end = right.x - map_start - start_offset;
        if sect == sections - 1 {
            let mut last_frame = (right.x / frame_dur).floor() * frame_dur;
            // A frame starting exactly on the end is not part of the clip.
            if right.x - last_frame < FRAME_EXACT_EPSILON {
                last_frame -= frame_dur;
            }
            sect_end = last_frame - map_start - start_offset;
            sect_end = (sect_end * 1_000_000.0).floor() / 1_000_000.0;
        }

        let sect_duration = sect_end - sect_start;
        if sect_duration == 0.0 {
            continue;
        }

        let contribution = if speed_change == 0.0 {
            sect_duration / end_speed
        } else {
            let m = speed_change / sect_duration;
            let b = start_speed - m * sect_start;
            (1.0 / m) * ((m * sect_end + b).abs().ln() - (m * sect_start + b).abs().ln())
        };

        if contribution.is_finite() {
            output += contribution;
        } else {
            warn!(
                section = sect,
                start_speed, end_speed, sect_duration, "skipping degenerate speed section"
            );
        }
    }

    let output = round_half_up(output / frame_dur) * frame_dur;
    // The last included frame is held for one frame.
    let output = output + frame_dur;
    Ok(round_half_up(output * 1000.0) / 1000.0)
}
