//! Easing curves used when interpolating between map points.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// How the normalized elapsed fraction of a section is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    /// Straight line between the two values.
    #[default]
    Linear,
    /// Cubic ease in/out.
    CubicInOut,
    /// Sinusoidal ease in/out.
    SinInOut,
    /// Step: the right value is reached as soon as any time has elapsed.
    Instant,
}

impl Easing {
    /// Map an elapsed fraction in `[0, 1]` to an eased fraction.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicInOut => {
                let t2 = t * 2.0;
                if t2 <= 1.0 {
                    t2 * t2 * t2 / 2.0
                } else {
                    let t3 = t2 - 2.0;
                    (t3 * t3 * t3 + 2.0) / 2.0
                }
            }
            Self::SinInOut => (1.0 - (PI * t).cos()) / 2.0,
            Self::Instant => {
                if t == 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Blend `start -> end` at elapsed fraction `t`.
    #[inline]
    pub fn blend(self, start: f64, end: f64, t: f64) -> f64 {
        start + (end - start) * self.apply(t)
    }
}

/// Ease a value between two timed samples, the way every section of a
/// point map is evaluated.
pub fn eased_value(
    easing: Easing,
    start_value: f64,
    end_value: f64,
    start_time: f64,
    end_time: f64,
    current_time: f64,
) -> f64 {
    let duration = end_time - start_time;
    if duration <= 0.0 {
        return end_value;
    }
    easing.blend(start_value, end_value, (current_time - start_time) / duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::CubicInOut,
        Easing::SinInOut,
        Easing::Instant,
    ];

    #[test]
    fn endpoints_are_stable() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-12, "{easing:?} at 1");
        }
    }

    #[test]
    fn smooth_curves_are_symmetric_at_midpoint() {
        assert!((Easing::CubicInOut.apply(0.5) - 0.5).abs() < 1e-12);
        assert!((Easing::SinInOut.apply(0.5) - 0.5).abs() < 1e-12);
        // Slow start.
        assert!(Easing::CubicInOut.apply(0.1) < 0.1);
        assert!(Easing::SinInOut.apply(0.1) < 0.1);
    }

    #[test]
    fn instant_jumps_immediately() {
        assert_eq!(Easing::Instant.apply(1e-9), 1.0);
        assert_eq!(Easing::Instant.blend(10.0, 20.0, 0.3), 20.0);
    }

    #[test]
    fn eased_value_handles_zero_length_sections() {
        assert_eq!(eased_value(Easing::Linear, 1.0, 2.0, 3.0, 3.0, 3.0), 2.0);
        assert!((eased_value(Easing::Linear, 1.0, 2.0, 0.0, 4.0, 1.0) - 1.25).abs() < 1e-12);
    }
}
