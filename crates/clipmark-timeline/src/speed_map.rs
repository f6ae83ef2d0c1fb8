//! Speed maps: piecewise speed over a clip.

use clipmark_core::{Easing, Result, Rounder};

use crate::point::SpeedPoint;
use crate::point_map::{PointMap, Side};

pub type SpeedMap = PointMap<SpeedPoint>;

/// Speed between two samples at `t`.
///
/// Equal endpoints short-circuit. A blend that comes out as zero or NaN
/// falls back to the right-hand speed, since a zero speed cannot be played.
pub fn interpolate_speed(
    left: &SpeedPoint,
    right: &SpeedPoint,
    t: f64,
    easing: Easing,
    rounder: Option<Rounder>,
) -> f64 {
    if left.y == right.y {
        return left.y;
    }
    let duration = right.x - left.x;
    let fraction = if duration > 0.0 {
        (t - left.x) / duration
    } else {
        1.0
    };
    let raw = easing.blend(left.y, right.y, fraction);
    let raw = if raw == 0.0 || raw.is_nan() { right.y } else { raw };
    match rounder {
        Some(rounder) if rounder.multiple > 0.0 => rounder.round(raw),
        _ => raw,
    }
}

impl PointMap<SpeedPoint> {
    /// Constant speed over `[start, end]`.
    pub fn constant(start: f64, end: f64, speed: f64) -> Result<Self> {
        Self::boundaries(SpeedPoint::new(start, speed), SpeedPoint::new(end, speed))
    }

    /// Speed at time `t`, clamped to the map's range.
    pub fn speed_at(&self, t: f64, easing: Easing, rounder: Option<Rounder>) -> f64 {
        if self.is_static() {
            return self.first().y;
        }
        let t = t.max(self.start()).min(self.end());
        let (left, right) = self.section_at(t);
        interpolate_speed(&self.points()[left], &self.points()[right], t, easing, rounder)
    }

    /// Move a boundary inward. The new boundary takes the linearly
    /// interpolated speed, which is what the duration integrator assumes
    /// between samples.
    pub fn shrink(&mut self, t: f64, side: Side, rounder: Option<Rounder>) -> Result<()> {
        self.shrink_with(t, side, |left, right, t| {
            Ok(SpeedPoint::new(
                t,
                interpolate_speed(left, right, t, Easing::Linear, rounder),
            ))
        })
    }

    /// Apply a new clip speed. A static map follows it entirely; a variable
    /// map only has its first point updated.
    pub fn follow_speed(&mut self, speed: f64) {
        let is_static = self.is_static();
        self.update_all_values(|index, point| {
            if index == 0 || is_static {
                point.y = speed;
            }
        });
    }

    /// Lowest and highest speed in the map.
    pub fn speed_range(&self) -> (f64, f64) {
        self.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> SpeedMap {
        SpeedMap::new([
            SpeedPoint::new(0.0, 1.0),
            SpeedPoint::new(2.0, 0.5),
            SpeedPoint::new(4.0, 0.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_speed_at_linear() {
        let map = ramp();
        assert_eq!(map.speed_at(1.0, Easing::Linear, None), 0.75);
        assert_eq!(map.speed_at(3.0, Easing::Linear, None), 0.5);
        assert_eq!(map.speed_at(-5.0, Easing::Linear, None), 1.0);
        assert_eq!(map.speed_at(99.0, Easing::Linear, None), 0.5);
    }

    #[test]
    fn test_speed_at_rounds() {
        let map = ramp();
        assert_eq!(map.speed_at(0.36, Easing::Linear, Some(Rounder::SPEED)), 0.9);
        let eased = map.speed_at(0.5, Easing::CubicInOut, None);
        assert!(eased > 0.9 && eased < 1.0);
    }

    #[test]
    fn test_zero_speed_falls_back_to_right() {
        let left = SpeedPoint::new(0.0, -1.0);
        let right = SpeedPoint::new(2.0, 1.0);
        assert_eq!(interpolate_speed(&left, &right, 1.0, Easing::Linear, None), 1.0);
    }

    #[test]
    fn test_follow_speed() {
        let mut fixed = SpeedMap::constant(0.0, 1.0, 1.0).unwrap();
        fixed.follow_speed(0.5);
        assert!(fixed.iter().all(|p| p.y == 0.5));

        let mut variable = ramp();
        variable.follow_speed(2.0);
        assert_eq!(variable.first().y, 2.0);
        assert_eq!(variable.last().y, 0.5);
    }

    #[test]
    fn test_shrink_uses_linear_speed() {
        let mut map = ramp();
        map.shrink(1.0, Side::End, None).unwrap();
        assert_eq!(map.points(), &[SpeedPoint::new(0.0, 1.0), SpeedPoint::new(1.0, 0.75)]);
        assert_eq!(map.speed_range(), (0.75, 1.0));
    }
}
