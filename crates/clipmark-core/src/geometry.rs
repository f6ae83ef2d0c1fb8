//! Crop rectangle geometry.
//!
//! A [`Crop`] is an axis-aligned rectangle inside a working resolution that
//! keeps its invariants under every operator: `x, y >= 0`, `x + w <= max_w`,
//! `y + h <= max_h`, `w >= min_w`, `h >= min_h`. Operators never fail; they
//! clamp the requested delta and return the delta that was actually applied
//! so callers can chain follow-up adjustments deterministically.

use glam::DVec2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::config::CropLimits;
use crate::defaults;
use crate::error::{ClipError, Result};
use crate::time::{clamp_number, round_half_up};

// ── Resolution ──────────────────────────────────────────────────

/// Working resolution that crop coordinates are expressed against.
/// Serialized as `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn size(self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64)
    }

    pub const HD_1080: Self = Self::new(1920, 1080);
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD_1080
    }
}

impl FromStr for Resolution {
    type Err = ClipError;

    /// Parse `WIDTHxHEIGHT`, e.g. `1920x1080`.
    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| ClipError::InvalidResolution(s.to_string()))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ClipError::InvalidResolution(s.to_string()))
        };
        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Serialize for Resolution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Resolution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Descriptor codec ────────────────────────────────────────────

/// Numeric crop components `(x, y, w, h)` resolved against a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl CropRect {
    #[inline]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Parse an `x:y:w:h` descriptor. `iw`/`ih` resolve to the full working
    /// width/height; numeric components are truncated to integers.
    pub fn parse(descriptor: &str, res: Resolution) -> Result<Self> {
        let parts: Vec<&str> = descriptor.split(':').collect();
        if parts.len() != 4 {
            return Err(ClipError::descriptor(format!(
                "expected 4 components in '{}'",
                descriptor
            )));
        }
        let component = |token: &str| -> Result<f64> {
            match token.trim() {
                "iw" => Ok(res.width as f64),
                "ih" => Ok(res.height as f64),
                other => other
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(f64::trunc)
                    .ok_or_else(|| {
                        ClipError::descriptor(format!(
                            "bad component '{}' in '{}'",
                            other, descriptor
                        ))
                    }),
            }
        };
        Ok(Self::new(
            component(parts[0])?,
            component(parts[1])?,
            component(parts[2])?,
            component(parts[3])?,
        ))
    }

    /// Numeric `x:y:w:h` form.
    pub fn to_descriptor(&self) -> String {
        format!("{}:{}:{}:{}", self.x, self.y, self.w, self.h)
    }

    /// Like [`Self::to_descriptor`] but emits `iw`/`ih` for full-size axes.
    pub fn to_symbolic_descriptor(&self, res: Resolution) -> String {
        let w = if self.x == 0.0 && self.w == res.width as f64 {
            "iw".to_string()
        } else {
            self.w.to_string()
        };
        let h = if self.y == 0.0 && self.h == res.height as f64 {
            "ih".to_string()
        } else {
            self.h.to_string()
        };
        format!("{}:{}:{}:{}", self.x, self.y, w, h)
    }

    #[inline]
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    #[inline]
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.w, self.h)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Width over height; `None` for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.w != 0.0 && self.h != 0.0).then(|| self.w / self.h)
    }

    /// Round every component half up.
    pub fn rounded(&self) -> Self {
        Self::new(
            round_half_up(self.x),
            round_half_up(self.y),
            round_half_up(self.w),
            round_half_up(self.h),
        )
    }
}

/// Scale the numeric components of a descriptor, leaving `iw`/`ih` symbolic.
pub fn multiply_descriptor(multiple_x: f64, multiple_y: f64, descriptor: &str) -> Result<String> {
    let parts: Vec<&str> = descriptor.split(':').collect();
    if parts.len() != 4 {
        return Err(ClipError::descriptor(descriptor.to_string()));
    }
    let scale = |token: &str, multiple: f64| -> Result<String> {
        match token {
            "iw" | "ih" => Ok(token.to_string()),
            other => other
                .parse::<f64>()
                .map(|v| round_half_up(v * multiple).to_string())
                .map_err(|_| ClipError::descriptor(descriptor.to_string())),
        }
    };
    Ok([
        scale(parts[0], multiple_x)?,
        scale(parts[1], multiple_y)?,
        scale(parts[2], multiple_x)?,
        scale(parts[3], multiple_y)?,
    ]
    .join(":"))
}

/// Applied deltas of a two-axis operator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AppliedDelta {
    pub dy: f64,
    pub dx: f64,
}

impl AppliedDelta {
    #[inline]
    pub const fn new(dy: f64, dx: f64) -> Self {
        Self { dy, dx }
    }
}

// ── Crop ────────────────────────────────────────────────────────

/// Constrained crop rectangle with resize and pan operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Crop {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    max_w: f64,
    max_h: f64,
    limits: CropLimits,
    default_aspect_ratio: f64,
    history: Vec<String>,
    history_capacity: usize,
}

impl Crop {
    /// Construct with default limits.
    pub fn new(x: f64, y: f64, w: f64, h: f64, max_w: f64, max_h: f64) -> Self {
        Self::with_limits(x, y, w, h, max_w, max_h, CropLimits::default())
    }

    /// Construct, clamping `x, y >= 0`, `max >= min` and `w, h` into
    /// `[min, max]`.
    pub fn with_limits(
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        max_w: f64,
        max_h: f64,
        limits: CropLimits,
    ) -> Self {
        let max_w = max_w.max(limits.min_w());
        let max_h = max_h.max(limits.min_h());
        let mut crop = Self {
            x: x.max(0.0),
            y: y.max(0.0),
            w: clamp_number(w, limits.min_w(), max_w),
            h: clamp_number(h, limits.min_h(), max_h),
            max_w,
            max_h,
            limits,
            default_aspect_ratio: 1.0,
            history: Vec::new(),
            history_capacity: defaults::CROP_HISTORY_CAPACITY,
        };
        // Pull the rectangle back inside the bounds when it overhangs.
        crop.x = crop.x.min(crop.max_w - crop.w);
        crop.y = crop.y.min(crop.max_h - crop.h);
        crop
    }

    /// Construct from numeric components and a working resolution.
    pub fn from_rect(rect: CropRect, res: Resolution, limits: CropLimits) -> Self {
        Self::with_limits(
            rect.x,
            rect.y,
            rect.w,
            rect.h,
            res.width as f64,
            res.height as f64,
            limits,
        )
    }

    /// Parse a descriptor against a working resolution.
    pub fn from_descriptor(descriptor: &str, res: Resolution, limits: CropLimits) -> Result<Self> {
        Ok(Self::from_rect(CropRect::parse(descriptor, res)?, res, limits))
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self.history.truncate(capacity);
        self
    }

    // ── Accessors ───────────────────────────────────────────────

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }
    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }
    #[inline]
    pub fn w(&self) -> f64 {
        self.w
    }
    #[inline]
    pub fn h(&self) -> f64 {
        self.h
    }
    #[inline]
    pub fn max_w(&self) -> f64 {
        self.max_w
    }
    #[inline]
    pub fn max_h(&self) -> f64 {
        self.max_h
    }
    #[inline]
    pub fn limits(&self) -> CropLimits {
        self.limits
    }

    /// Right edge.
    #[inline]
    pub fn r(&self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge.
    #[inline]
    pub fn b(&self) -> f64 {
        self.y + self.h
    }

    #[inline]
    pub fn cx(&self) -> f64 {
        self.x + self.w / 2.0
    }

    #[inline]
    pub fn cy(&self) -> f64 {
        self.y + self.h / 2.0
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.cx(), self.cy())
    }

    #[inline]
    pub fn rect(&self) -> CropRect {
        CropRect::new(self.x, self.y, self.w, self.h)
    }

    pub fn set_default_aspect_ratio(&mut self, ratio: f64) {
        self.default_aspect_ratio = ratio;
    }

    /// Width over height, or the default ratio for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> f64 {
        if self.w == 0.0 || self.h == 0.0 {
            self.default_aspect_ratio
        } else {
            self.w / self.h
        }
    }

    /// Split of a combined diagonal delta between the axes, weighted by
    /// `w / (w + h)`.
    pub fn aspect_ratio_pair(&self) -> (f64, f64) {
        let ratio = self.aspect_ratio();
        let a = ratio / (ratio + 1.0);
        (a, 1.0 - a)
    }

    // ── Descriptor round-trip ───────────────────────────────────

    pub fn to_descriptor(&self) -> String {
        self.rect().to_descriptor()
    }

    pub fn to_symbolic_descriptor(&self) -> String {
        self.rect().to_symbolic_descriptor(self.resolution())
    }

    fn resolution(&self) -> Resolution {
        Resolution::new(self.max_w as u32, self.max_h as u32)
    }

    /// Overwrite the components without clamping. Used to restore a known
    /// good state from history.
    fn set_descriptor_unchecked(&mut self, descriptor: &str) {
        match CropRect::parse(descriptor, self.resolution()) {
            Ok(rect) => {
                self.x = rect.x;
                self.y = rect.y;
                self.w = rect.w;
                self.h = rect.h;
            }
            Err(err) => trace!(%err, "ignoring unparsable crop history entry"),
        }
    }

    /// Assign a new descriptor, clamped into bounds. A descriptor with the
    /// current size is treated as a drag (position only). With
    /// `keep_aspect_ratio`, the height is re-derived from the width (or the
    /// width from the height when that does not fit).
    pub fn set_descriptor_safe(&mut self, descriptor: &str, keep_aspect_ratio: bool) -> Result<()> {
        let next = CropRect::parse(descriptor, self.resolution())?;
        let (min_w, min_h) = (self.limits.min_w(), self.limits.min_h());
        let is_drag = next.w == self.w && next.h == self.h;

        let max_x = if is_drag { self.max_w - self.w } else { self.max_w - min_w };
        let max_y = if is_drag { self.max_h - self.h } else { self.max_h - min_h };
        let cx = clamp_number(next.x, 0.0, max_x);
        let cy = clamp_number(next.y, 0.0, max_y);

        let mut cw = if is_drag { self.w } else { clamp_number(next.w, min_w, self.max_w - cx) };
        let mut ch = if is_drag { self.h } else { clamp_number(next.h, min_h, self.max_h - cy) };

        if keep_aspect_ratio {
            let ratio = self.aspect_ratio();
            let ph = (cw / ratio).floor();
            let pw = (ch * ratio).floor();
            let ph_fits = min_h <= ph && ph <= self.max_h;
            let pw_fits = min_w <= pw && pw <= self.max_w;
            if ph_fits {
                ch = ph;
            } else if pw_fits {
                cw = pw;
            } else {
                return Err(ClipError::AspectRatioUnsatisfiable);
            }
        }

        self.x = cx;
        self.y = cy;
        self.w = cw;
        self.h = ch;
        Ok(())
    }

    // ── Local history ───────────────────────────────────────────

    /// Remember a descriptor (the current one when `None`).
    pub fn push_history(&mut self, descriptor: Option<&str>) {
        let entry = descriptor.map_or_else(|| self.to_descriptor(), str::to_string);
        self.history.push(entry);
        if self.history.len() > self.history_capacity {
            self.history.remove(0);
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn peek_history(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Restore and drop the most recent entry.
    pub fn pop_history(&mut self) -> Option<String> {
        let entry = self.history.pop()?;
        self.set_descriptor_unchecked(&entry);
        Some(entry)
    }

    /// Restore the most recent entry, keeping it on the stack.
    pub fn apply_prev_history(&mut self) -> bool {
        match self.history.last().cloned() {
            Some(entry) => {
                self.set_descriptor_unchecked(&entry);
                true
            }
            None => false,
        }
    }

    // ── Pan ─────────────────────────────────────────────────────

    pub fn pan_x(&mut self, delta: f64) -> f64 {
        let delta = clamp_number(delta, -self.x, self.max_w - self.r());
        self.x += delta;
        delta
    }

    pub fn pan_y(&mut self, delta: f64) -> f64 {
        let delta = clamp_number(delta, -self.y, self.max_h - self.b());
        self.y += delta;
        delta
    }

    // ── Edge clamp bounds ───────────────────────────────────────

    #[inline]
    pub fn min_resize_n(&self) -> f64 {
        -(self.b() - self.limits.min_h() - self.y)
    }
    #[inline]
    pub fn max_resize_n(&self) -> f64 {
        self.y
    }
    #[inline]
    pub fn min_resize_e(&self) -> f64 {
        -(self.r() - (self.x + self.limits.min_w()))
    }
    #[inline]
    pub fn max_resize_e(&self) -> f64 {
        self.max_w - self.r()
    }
    #[inline]
    pub fn min_resize_s(&self) -> f64 {
        -(self.b() - (self.y + self.limits.min_h()))
    }
    #[inline]
    pub fn max_resize_s(&self) -> f64 {
        self.max_h - self.b()
    }
    #[inline]
    pub fn min_resize_w(&self) -> f64 {
        -(self.r() - self.limits.min_w() - self.x)
    }
    #[inline]
    pub fn max_resize_w(&self) -> f64 {
        self.x
    }

    pub fn clamp_resize_n(&self, delta: f64) -> f64 {
        clamp_number(delta, self.min_resize_n(), self.max_resize_n())
    }
    pub fn clamp_resize_e(&self, delta: f64) -> f64 {
        clamp_number(delta, self.min_resize_e(), self.max_resize_e())
    }
    pub fn clamp_resize_s(&self, delta: f64) -> f64 {
        clamp_number(delta, self.min_resize_s(), self.max_resize_s())
    }
    pub fn clamp_resize_w(&self, delta: f64) -> f64 {
        clamp_number(delta, self.min_resize_w(), self.max_resize_w())
    }

    /// Largest shrink of the vertical half-extent around the center.
    #[inline]
    fn min_center_resize_y(&self) -> f64 {
        -(self.b() - self.cy() - self.limits.min_h() / 2.0)
    }

    #[inline]
    fn min_center_resize_x(&self) -> f64 {
        -(self.r() - self.cx() - self.limits.min_w() / 2.0)
    }

    // ── Single edge ─────────────────────────────────────────────

    /// Move the top edge outward by `delta` (negative shrinks).
    pub fn resize_n(&mut self, delta: f64) -> f64 {
        let delta = self.clamp_resize_n(delta);
        self.resize_n_unclamped(delta)
    }

    pub fn resize_n_unclamped(&mut self, delta: f64) -> f64 {
        self.y -= delta;
        self.h += delta;
        delta
    }

    pub fn resize_e(&mut self, delta: f64) -> f64 {
        let delta = self.clamp_resize_e(delta);
        self.resize_e_unclamped(delta)
    }

    pub fn resize_e_unclamped(&mut self, delta: f64) -> f64 {
        self.w += delta;
        delta
    }

    pub fn resize_s(&mut self, delta: f64) -> f64 {
        let delta = self.clamp_resize_s(delta);
        self.resize_s_unclamped(delta)
    }

    pub fn resize_s_unclamped(&mut self, delta: f64) -> f64 {
        self.h += delta;
        delta
    }

    pub fn resize_w(&mut self, delta: f64) -> f64 {
        let delta = self.clamp_resize_w(delta);
        self.resize_w_unclamped(delta)
    }

    pub fn resize_w_unclamped(&mut self, delta: f64) -> f64 {
        self.x -= delta;
        self.w += delta;
        delta
    }

    // ── Corners ─────────────────────────────────────────────────

    pub fn resize_ne(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        AppliedDelta::new(self.resize_n(dy), self.resize_e(dx))
    }

    pub fn resize_se(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        AppliedDelta::new(self.resize_s(dy), self.resize_e(dx))
    }

    pub fn resize_sw(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        AppliedDelta::new(self.resize_s(dy), self.resize_w(dx))
    }

    pub fn resize_nw(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        AppliedDelta::new(self.resize_n(dy), self.resize_w(dx))
    }

    // ── Center-preserving ───────────────────────────────────────

    /// Clamp a symmetric vertical delta: growth must fit both edges, shrink
    /// stops at half the minimum height from the center.
    fn clamp_center_resize_y(&self, delta: f64) -> f64 {
        if delta >= 0.0 {
            self.clamp_resize_s(self.clamp_resize_n(delta))
        } else {
            delta.max(self.min_center_resize_y())
        }
    }

    fn clamp_center_resize_x(&self, delta: f64) -> f64 {
        if delta >= 0.0 {
            self.clamp_resize_w(self.clamp_resize_e(delta))
        } else {
            delta.max(self.min_center_resize_x())
        }
    }

    /// Grow or shrink top and bottom together.
    pub fn resize_ns(&mut self, delta: f64) -> f64 {
        let delta = self.clamp_center_resize_y(delta);
        self.resize_n_unclamped(delta);
        self.resize_s_unclamped(delta);
        delta
    }

    /// Grow or shrink left and right together.
    pub fn resize_ew(&mut self, delta: f64) -> f64 {
        let delta = self.clamp_center_resize_x(delta);
        self.resize_e_unclamped(delta);
        self.resize_w_unclamped(delta);
        delta
    }

    /// Move all four edges, keeping the center.
    pub fn resize_nesw(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        let dy = self.clamp_center_resize_y(dy);
        let dx = self.clamp_center_resize_x(dx);
        self.resize_n_unclamped(dy);
        self.resize_s_unclamped(dy);
        self.resize_e_unclamped(dx);
        self.resize_w_unclamped(dx);
        AppliedDelta::new(dy, dx)
    }

    // ── Aspect-ratio locked ─────────────────────────────────────
    //
    // Each variant clamps the primary axis, derives the paired axis through
    // the ratio, rounds and clamps it, then re-derives the primary axis from
    // the clamped pair and clamps again. Either axis can be the limiting one.

    pub fn resize_n_aspect_ratio_locked(&mut self, delta: f64) -> AppliedDelta {
        let ratio = self.aspect_ratio();
        let dy = self.clamp_resize_n(delta);
        let dx = self.resize_e(round_half_up(dy * ratio));
        let dy = self.resize_n(round_half_up(dx / ratio));
        AppliedDelta::new(dy, dx)
    }

    pub fn resize_e_aspect_ratio_locked(&mut self, delta: f64) -> AppliedDelta {
        let ratio = self.aspect_ratio();
        let dx = self.clamp_resize_e(round_half_up(delta));
        let dy = self.resize_s(round_half_up(dx / ratio));
        let dx = self.resize_e(round_half_up(dy * ratio));
        AppliedDelta::new(dy, dx)
    }

    pub fn resize_s_aspect_ratio_locked(&mut self, delta: f64) -> AppliedDelta {
        let ratio = self.aspect_ratio();
        let dy = self.clamp_resize_s(delta);
        let dx = self.resize_e(round_half_up(dy * ratio));
        let dy = self.resize_s(round_half_up(dx / ratio));
        AppliedDelta::new(dy, dx)
    }

    pub fn resize_w_aspect_ratio_locked(&mut self, delta: f64) -> AppliedDelta {
        let ratio = self.aspect_ratio();
        let dx = self.clamp_resize_w(delta);
        let dy = self.resize_s(round_half_up(dx / ratio));
        let dx = self.resize_w(round_half_up(dy * ratio));
        AppliedDelta::new(dy, dx)
    }

    /// Fold a corner drag into one vertical delta, then run the two-pass
    /// derive/clamp protocol with the given edge clamps.
    fn locked_corner_deltas(
        &self,
        dy: f64,
        dx: f64,
        clamp_y: impl Fn(&Self, f64) -> f64,
        clamp_x: impl Fn(&Self, f64) -> f64,
    ) -> AppliedDelta {
        let ratio = self.aspect_ratio();
        let (a, b) = self.aspect_ratio_pair();
        let dx = dx * a;
        let dy = dy * b + dx / ratio;
        let dy = clamp_y(self, dy);

        let dx = clamp_x(self, round_half_up(dy * ratio));
        let dy = clamp_y(self, round_half_up(dx / ratio));
        AppliedDelta::new(dy, dx)
    }

    pub fn resize_se_aspect_ratio_locked(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        let applied = self.locked_corner_deltas(dy, dx, Self::clamp_resize_s, Self::clamp_resize_e);
        self.resize_s_unclamped(applied.dy);
        self.resize_e_unclamped(applied.dx);
        applied
    }

    pub fn resize_sw_aspect_ratio_locked(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        let applied = self.locked_corner_deltas(dy, dx, Self::clamp_resize_s, Self::clamp_resize_w);
        self.resize_s_unclamped(applied.dy);
        self.resize_w_unclamped(applied.dx);
        applied
    }

    pub fn resize_ne_aspect_ratio_locked(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        let applied = self.locked_corner_deltas(dy, dx, Self::clamp_resize_n, Self::clamp_resize_e);
        self.resize_n_unclamped(applied.dy);
        self.resize_e_unclamped(applied.dx);
        applied
    }

    pub fn resize_nw_aspect_ratio_locked(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        let applied = self.locked_corner_deltas(dy, dx, Self::clamp_resize_n, Self::clamp_resize_w);
        self.resize_n_unclamped(applied.dy);
        self.resize_w_unclamped(applied.dx);
        applied
    }

    /// Symmetric vertical resize with the width following the ratio.
    pub fn resize_ns_aspect_ratio_locked(&mut self, delta: f64) -> AppliedDelta {
        let ratio = self.aspect_ratio();
        let dy = self.clamp_center_resize_y(delta);
        let dx = self.clamp_center_resize_x(round_half_up(dy * ratio));
        let dy = self.clamp_center_resize_y(round_half_up(dx / ratio));
        self.apply_center_resize(dy, dx)
    }

    /// Symmetric horizontal resize with the height following the ratio.
    pub fn resize_ew_aspect_ratio_locked(&mut self, delta: f64) -> AppliedDelta {
        let ratio = self.aspect_ratio();
        let dx = self.clamp_center_resize_x(round_half_up(delta));
        let dy = self.clamp_center_resize_y(round_half_up(dx / ratio));
        let dx = self.clamp_center_resize_x(round_half_up(dy * ratio));
        self.apply_center_resize(dy, dx)
    }

    /// Diagonal zoom around the center.
    ///
    /// The dominant axis of the gesture picks expand vs shrink; the folded
    /// delta is then forced to that sign before the usual two-pass clamp.
    pub fn resize_nesw_aspect_ratio_locked(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        let ratio = self.aspect_ratio();
        let (a, b) = self.aspect_ratio_pair();
        let is_expand = if dx.abs() > dy.abs() { dx >= 0.0 } else { dy >= 0.0 };
        let dx = dx * a;
        let dy = dy * b + dx / ratio;

        let dy = if is_expand { dy.max(0.0) } else { dy.min(0.0) };

        let dy = self.clamp_center_resize_y(dy);
        let dx = self.clamp_center_resize_x(round_half_up(dy * ratio));
        let dy = self.clamp_center_resize_y(round_half_up(dx / ratio));
        self.apply_center_resize(dy, dx)
    }

    fn apply_center_resize(&mut self, dy: f64, dx: f64) -> AppliedDelta {
        self.resize_n_unclamped(dy);
        self.resize_e_unclamped(dx);
        self.resize_s_unclamped(dy);
        self.resize_w_unclamped(dx);
        AppliedDelta::new(dy, dx)
    }

    /// Whether every invariant holds.
    pub fn is_valid(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.r() <= self.max_w
            && self.b() <= self.max_h
            && self.w >= self.limits.min_w()
            && self.h >= self.limits.min_h()
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_descriptor())
    }
}
