//! Crop maps: a crop region that varies over a clip.
//!
//! Descriptors are stored as strings and resolved against the working
//! resolution whenever arithmetic is needed, so `iw`/`ih` stay symbolic
//! until a point is actually edited.

use tracing::debug;

use clipmark_core::{
    eased_value, multiply_descriptor, round_half_up, ClipError, Crop, CropLimits, CropRect,
    Easing, Resolution, Result,
};

use crate::point::CropPoint;
use crate::point_map::{PointMap, Side};

pub type CropMap = PointMap<CropPoint>;

/// Area and size summary of a crop map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSizeStats {
    pub min_w: f64,
    pub min_h: f64,
    pub min_size: f64,
    pub max_w: f64,
    pub max_h: f64,
    pub max_size: f64,
    pub avg_w: f64,
    pub avg_h: f64,
    pub avg_size: f64,
}

/// Width, height, area and aspect ratio of one descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSize {
    pub w: f64,
    pub h: f64,
    pub size: f64,
    pub aspect_ratio: f64,
}

pub fn crop_size(descriptor: &str, res: Resolution) -> Result<CropSize> {
    let rect = CropRect::parse(descriptor, res)?;
    Ok(CropSize {
        w: rect.w,
        h: rect.h,
        size: rect.area(),
        aspect_ratio: rect.w / rect.h,
    })
}

/// Crop between two samples at `t`.
///
/// All four components share one eased fraction. The curve is a sine ease
/// unless the right-hand point eases in instantly.
pub fn interpolate_crop(
    left: &CropPoint,
    right: &CropPoint,
    t: f64,
    res: Resolution,
) -> Result<CropRect> {
    let start = CropRect::parse(&left.crop, res)?;
    let end = CropRect::parse(&right.crop, res)?;
    if left.crop == right.crop {
        return Ok(start);
    }
    let easing = if right.is_instant() {
        Easing::Instant
    } else {
        Easing::SinInOut
    };
    let t = t.max(left.x).min(right.x);
    let ease = |a: f64, b: f64| eased_value(easing, a, b, left.x, right.x, t);
    Ok(CropRect::new(
        ease(start.x, end.x),
        ease(start.y, end.y),
        ease(start.w, end.w),
        ease(start.h, end.h),
    ))
}

/// Resize `rect` to `ratio` keeping its larger side, shrink to fit the
/// resolution, then pan back to the original top-left.
fn fit_aspect_ratio(rect: CropRect, ratio: f64, res: Resolution, limits: CropLimits) -> CropRect {
    let (max_w, max_h) = (res.width as f64, res.height as f64);
    let (mut w, mut h) = if rect.w >= rect.h {
        (rect.w, round_half_up(rect.w / ratio))
    } else {
        (round_half_up(rect.h * ratio), rect.h)
    };
    if w > max_w {
        w = max_w;
        h = round_half_up(w / ratio);
    }
    if h > max_h {
        h = max_h;
        w = round_half_up(h * ratio);
    }
    let mut crop = Crop::with_limits(0.0, 0.0, w, h, max_w, max_h, limits);
    crop.pan_x(rect.x);
    crop.pan_y(rect.y);
    crop.rect()
}

impl PointMap<CropPoint> {
    /// The same crop over `[start, end]`.
    pub fn constant(start: f64, end: f64, crop: &str) -> Result<Self> {
        Self::boundaries(CropPoint::new(start, crop), CropPoint::new(end, crop))
    }

    /// Resolved rectangle of one point.
    pub fn rect_at_index(&self, index: usize, res: Resolution) -> Option<Result<CropRect>> {
        self.get(index).map(|p| CropRect::parse(&p.crop, res))
    }

    /// Interpolated crop at `t`, clamped to the map's range.
    pub fn crop_at(&self, t: f64, res: Resolution) -> Result<CropRect> {
        let (left, right) = self.section_at(t);
        interpolate_crop(&self.points()[left], &self.points()[right], t, res)
    }

    /// Insert a point at `t` that carries its predecessor's crop, so the
    /// visible crop does not jump.
    pub fn insert_inherited(&mut self, t: f64) -> Result<usize> {
        if !(self.start()..=self.end()).contains(&t) {
            return Err(ClipError::TimeOutOfBounds {
                time: t,
                start: self.start(),
                end: self.end(),
            });
        }
        let (lo, _) = self.lookup(t);
        let crop = self.points()[lo].crop.clone();
        self.insert(CropPoint::new(t, crop))
    }

    /// Copy the crop of the point before (`from_next == false`) or after
    /// `index` into it.
    pub fn inherit_crop(&mut self, index: usize, from_next: bool) -> Result<()> {
        let source = if from_next {
            index.checked_add(1)
        } else {
            index.checked_sub(1)
        };
        let crop = source
            .and_then(|i| self.get(i))
            .map(|p| p.crop.clone())
            .ok_or(ClipError::IndexOutOfRange {
                index: source.unwrap_or(usize::MAX),
                len: self.len(),
            })?;
        self.update_value(index, |point| point.crop = crop)
    }

    /// Move a boundary inward, taking the interpolated crop at `t`. A
    /// static map only moves its boundary time.
    ///
    /// Pan-only maps keep one crop size: the new boundary is forced back to
    /// the size of its remaining neighbour and that aspect ratio is pushed to
    /// every other point.
    pub fn shrink(
        &mut self,
        t: f64,
        side: Side,
        res: Resolution,
        limits: CropLimits,
        enable_zoom_pan: bool,
    ) -> Result<()> {
        if self.is_static() {
            // Both points share one descriptor; keep it symbolic.
            return self.shrink_with(t, side, |left, right, t| {
                let kept = match side {
                    Side::Start => left,
                    Side::End => right,
                };
                Ok(CropPoint::new(t, kept.crop.clone()).with_ease_in(kept.ease_in))
            });
        }
        self.shrink_with(t, side, |left, right, t| {
            let rect = interpolate_crop(left, right, t, res)?.rounded();
            let ease_in = match side {
                Side::Start => left.ease_in,
                Side::End => right.ease_in,
            };
            Ok(CropPoint::new(t, rect.to_descriptor()).with_ease_in(ease_in))
        })?;

        if enable_zoom_pan {
            return Ok(());
        }

        let (boundary, reference) = match side {
            Side::Start => (0, 1),
            Side::End => (self.len() - 1, self.len() - 2),
        };
        let reference_rect = CropRect::parse(&self.points()[reference].crop, res)?;
        let boundary_rect = CropRect::parse(&self.points()[boundary].crop, res)?;
        let sized = CropRect::new(
            boundary_rect.x,
            boundary_rect.y,
            reference_rect.w,
            reference_rect.h,
        );
        let crop = Crop::from_rect(sized, res, limits);
        self.update_value(boundary, |point| point.crop = crop.to_descriptor())?;

        let ratio = reference_rect.w / reference_rect.h;
        self.set_aspect_ratio_for_all_points(ratio, res, limits, Some(reference))
    }

    /// Refit every point except `except` to `ratio`.
    pub fn set_aspect_ratio_for_all_points(
        &mut self,
        ratio: f64,
        res: Resolution,
        limits: CropLimits,
        except: Option<usize>,
    ) -> Result<()> {
        if !(ratio > 0.0) || !ratio.is_finite() {
            return Err(ClipError::parameter(format!(
                "aspect ratio must be positive, got {}",
                ratio
            )));
        }
        let rects = self
            .iter()
            .map(|p| CropRect::parse(&p.crop, res))
            .collect::<Result<Vec<_>>>()?;
        self.update_all_values(|index, point| {
            if Some(index) != except {
                point.crop = fit_aspect_ratio(rects[index], ratio, res, limits).to_descriptor();
            }
        });
        debug!(ratio, points = self.len(), ?except, "applied aspect ratio to crop map");
        Ok(())
    }

    /// Scale every descriptor, e.g. after the working resolution changed.
    pub fn multiply(&mut self, multiple_x: f64, multiple_y: f64) -> Result<()> {
        let scaled = self
            .iter()
            .map(|p| multiply_descriptor(multiple_x, multiple_y, &p.crop))
            .collect::<Result<Vec<_>>>()?;
        self.update_all_values(|index, point| point.crop = scaled[index].clone());
        Ok(())
    }

    /// Whether the crop area changes anywhere in the map.
    pub fn is_variable_size(&self, res: Resolution) -> Result<bool> {
        let first = crop_size(&self.first().crop, res)?.size;
        for point in self.iter() {
            if crop_size(&point.crop, res)?.size != first {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Smallest and largest crop by area, plus an average crop whose width
    /// is the mean width and whose height follows the first point's ratio.
    pub fn size_stats(&self, res: Resolution) -> Result<CropSizeStats> {
        let aspect_ratio = crop_size(&self.first().crop, res)?.aspect_ratio;
        let mut stats = CropSizeStats {
            min_w: f64::INFINITY,
            min_h: f64::INFINITY,
            min_size: f64::INFINITY,
            max_w: f64::NEG_INFINITY,
            max_h: f64::NEG_INFINITY,
            max_size: f64::NEG_INFINITY,
            avg_w: 0.0,
            avg_h: 0.0,
            avg_size: 0.0,
        };
        let mut mean_w = 0.0;
        for (i, point) in self.iter().enumerate() {
            let CropSize { w, h, size, .. } = crop_size(&point.crop, res)?;
            if size < stats.min_size {
                (stats.min_w, stats.min_h, stats.min_size) = (w, h, size);
            }
            if size > stats.max_size {
                (stats.max_w, stats.max_h, stats.max_size) = (w, h, size);
            }
            mean_w += (w - mean_w) / (i + 1) as f64;
        }
        stats.avg_h = (mean_w / aspect_ratio).floor();
        stats.avg_w = mean_w.floor();
        stats.avg_size = stats.avg_w * stats.avg_h;
        Ok(stats)
    }
}
