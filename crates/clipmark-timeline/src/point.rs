//! Time-keyed points stored in speed and crop maps.

use serde::{Deserialize, Serialize};

/// Behaviour shared by every point a [`crate::PointMap`] can hold.
pub trait MapPoint: Clone {
    /// Time of the point in seconds.
    fn time(&self) -> f64;

    fn set_time(&mut self, time: f64);

    /// Whether two points carry the same value (time is ignored).
    fn same_value(&self, other: &Self) -> bool;

    /// Copy of this point placed at `time`, used when a boundary is
    /// extended past a dynamic section.
    fn relocated(&self, time: f64) -> Self {
        let mut point = self.clone();
        point.set_time(time);
        point
    }
}

/// A speed sample: `y` is the playback speed at time `x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedPoint {
    pub x: f64,
    pub y: f64,
}

impl SpeedPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl MapPoint for SpeedPoint {
    #[inline]
    fn time(&self) -> f64 {
        self.x
    }

    #[inline]
    fn set_time(&mut self, time: f64) {
        self.x = time;
    }

    fn same_value(&self, other: &Self) -> bool {
        self.y == other.y
    }
}

/// How the crop transitions into a point from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EaseIn {
    /// Jump to this point's crop as soon as the section starts.
    Instant,
}

/// A crop sample: a descriptor in effect at time `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropPoint {
    pub x: f64,
    pub crop: String,
    /// Absent means the default smooth ease.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease_in: Option<EaseIn>,
}

impl CropPoint {
    pub fn new(x: f64, crop: impl Into<String>) -> Self {
        Self {
            x,
            crop: crop.into(),
            ease_in: None,
        }
    }

    pub fn with_ease_in(mut self, ease_in: Option<EaseIn>) -> Self {
        self.ease_in = ease_in;
        self
    }

    #[inline]
    pub fn is_instant(&self) -> bool {
        self.ease_in == Some(EaseIn::Instant)
    }

    /// Flip between instant and smooth ease-in.
    pub fn toggle_ease_in(&mut self) {
        self.ease_in = match self.ease_in {
            None => Some(EaseIn::Instant),
            Some(EaseIn::Instant) => None,
        };
    }
}

impl MapPoint for CropPoint {
    #[inline]
    fn time(&self) -> f64 {
        self.x
    }

    #[inline]
    fn set_time(&mut self, time: f64) {
        self.x = time;
    }

    fn same_value(&self, other: &Self) -> bool {
        self.crop == other.crop
    }

    /// New boundary points always use the default ease.
    fn relocated(&self, time: f64) -> Self {
        Self::new(time, self.crop.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_point_serializes_camel_case() {
        let point = CropPoint::new(1.5, "0:0:iw:ih").with_ease_in(Some(EaseIn::Instant));
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"x":1.5,"crop":"0:0:iw:ih","easeIn":"instant"}"#);

        let plain: CropPoint = serde_json::from_str(r#"{"x":0,"y":0,"crop":"1:2:3:4"}"#).unwrap();
        assert_eq!(plain.ease_in, None);
        assert!(!serde_json::to_string(&plain).unwrap().contains("easeIn"));
    }

    #[test]
    fn relocated_crop_point_drops_ease_in() {
        let point = CropPoint::new(1.0, "1:2:3:4").with_ease_in(Some(EaseIn::Instant));
        let moved = point.relocated(3.0);
        assert_eq!(moved.x, 3.0);
        assert_eq!(moved.crop, "1:2:3:4");
        assert!(!moved.is_instant());
    }

    #[test]
    fn toggle_ease_in() {
        let mut point = CropPoint::new(0.0, "0:0:10:10");
        point.toggle_ease_in();
        assert!(point.is_instant());
        point.toggle_ease_in();
        assert_eq!(point.ease_in, None);
    }
}
