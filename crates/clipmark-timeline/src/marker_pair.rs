//! Marker pairs: one clip with its speed and crop behaviour.
//!
//! [`ClipState`] is the undoable part of a clip. Every edit runs against a
//! cloned snapshot through [`MarkerPair::edit`]; only a successful edit is
//! committed, pushed to history and followed by a duration refresh.

use tracing::{debug, warn};
use uuid::Uuid;

use clipmark_core::{ClipError, Crop, CropLimits, CropRect, EngineConfig, Resolution, Result};

use crate::crop_map::CropMap;
use crate::duration::compute_output_duration;
use crate::history::History;
use crate::point::{CropPoint, SpeedPoint};
use crate::point_map::{SectionCursor, Side};
use crate::settings::SettingsLayer;
use crate::speed_map::SpeedMap;

/// The fields of a clip that undo/redo restores.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipState {
    pub start: f64,
    pub end: f64,
    pub speed: f64,
    pub speed_map: SpeedMap,
    /// Mirrors the crop of the first crop point.
    pub crop: String,
    pub crop_map: CropMap,
    /// When false the crop map is pan-only: every point shares one size.
    pub enable_zoom_pan: bool,
    pub crop_res: Resolution,
}

impl ClipState {
    /// A clip with constant speed and crop.
    pub fn new(start: f64, end: f64, speed: f64, crop: &str, crop_res: Resolution) -> Result<Self> {
        let state = Self {
            start,
            end,
            speed,
            speed_map: SpeedMap::constant(start, end, speed)?,
            crop: crop.to_string(),
            crop_map: CropMap::constant(start, end, crop)?,
            enable_zoom_pan: false,
            crop_res,
        };
        state.validate()?;
        Ok(state)
    }

    /// Check the cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        if !(self.start < self.end) {
            return Err(ClipError::InvalidBoundary(format!(
                "start {} must precede end {}",
                self.start, self.end
            )));
        }
        for (name, start, end) in [
            ("speed", self.speed_map.start(), self.speed_map.end()),
            ("crop", self.crop_map.start(), self.crop_map.end()),
        ] {
            if start != self.start || end != self.end {
                return Err(ClipError::point_map(format!(
                    "{} map spans [{}, {}] but the clip spans [{}, {}]",
                    name, start, end, self.start, self.end
                )));
            }
        }
        CropRect::parse(&self.crop, self.crop_res)?;
        for point in self.crop_map.iter() {
            CropRect::parse(&point.crop, self.crop_res)?;
        }
        Ok(())
    }

    fn limits(&self, config: &EngineConfig) -> CropLimits {
        config.crop_limits(self.crop_res)
    }

    fn sync_crop(&mut self) {
        self.crop = self.crop_map.first().crop.clone();
    }

    // ── Boundaries ──────────────────────────────────────────────

    /// Move the clip start, stretching or shrinking both maps.
    pub fn move_start(&mut self, time: f64, config: &EngineConfig) -> Result<()> {
        let time = config.time_rounding.round(time);
        if time >= self.end {
            return Err(ClipError::InvalidBoundary(format!(
                "start {} would not precede end {}",
                time, self.end
            )));
        }
        self.move_boundary(time, Side::Start, config)
    }

    /// Move the clip end, stretching or shrinking both maps.
    pub fn move_end(&mut self, time: f64, config: &EngineConfig) -> Result<()> {
        let time = config.time_rounding.round(time);
        if time <= self.start {
            return Err(ClipError::InvalidBoundary(format!(
                "end {} would not follow start {}",
                time, self.start
            )));
        }
        self.move_boundary(time, Side::End, config)
    }

    fn move_boundary(&mut self, time: f64, side: Side, config: &EngineConfig) -> Result<()> {
        let current = match side {
            Side::Start => self.start,
            Side::End => self.end,
        };
        let outward = match side {
            Side::Start => time < current,
            Side::End => time > current,
        };
        if time == current {
            return Ok(());
        }

        let limits = self.limits(config);
        if outward {
            debug!(?side, from = current, to = time, "stretching clip");
            self.speed_map.stretch(time, side)?;
            self.crop_map.stretch(time, side)?;
        } else {
            debug!(?side, from = current, to = time, "shrinking clip");
            self.speed_map
                .shrink(time, side, Some(config.speed_rounding))?;
            self.crop_map
                .shrink(time, side, self.crop_res, limits, self.enable_zoom_pan)?;
        }
        match side {
            Side::Start => self.start = time,
            Side::End => self.end = time,
        }
        self.speed = self.speed_map.first().y;
        self.sync_crop();
        Ok(())
    }

    // ── Speed ───────────────────────────────────────────────────

    pub fn set_speed(&mut self, speed: f64, config: &EngineConfig) {
        let speed = config.normalize_speed(speed);
        self.speed = speed;
        self.speed_map.follow_speed(speed);
    }

    pub fn insert_speed_point(&mut self, time: f64, speed: f64, config: &EngineConfig) -> Result<usize> {
        let time = config.time_rounding.round(time);
        let speed = config.normalize_speed(speed);
        let index = self.speed_map.insert(SpeedPoint::new(time, speed))?;
        if index == 0 {
            self.speed = speed;
        }
        Ok(index)
    }

    pub fn delete_speed_point(&mut self, index: usize) -> Result<SpeedPoint> {
        let len = self.speed_map.len();
        self.speed_map
            .delete(index)
            .ok_or_else(|| refused_delete(index, len))
    }

    pub fn set_speed_point(&mut self, index: usize, speed: f64, config: &EngineConfig) -> Result<()> {
        let speed = config.normalize_speed(speed);
        self.speed_map.update_value(index, |p| p.y = speed)?;
        if index == 0 {
            self.speed = speed;
        }
        Ok(())
    }

    // ── Crop ────────────────────────────────────────────────────

    /// Add a crop point at `time` carrying the crop in effect before it.
    pub fn insert_crop_point(&mut self, time: f64, config: &EngineConfig) -> Result<usize> {
        let time = config.time_rounding.round(time);
        self.crop_map.insert_inherited(time)
    }

    pub fn delete_crop_point(&mut self, index: usize, cursor: &mut SectionCursor) -> Result<CropPoint> {
        let len = self.crop_map.len();
        let removed = self
            .crop_map
            .delete_with_cursor(index, cursor)
            .ok_or_else(|| refused_delete(index, len))?;
        self.sync_crop();
        Ok(removed)
    }

    /// Assign a crop to one point, clamped into the working resolution.
    ///
    /// Editing the first point of a static map edits both points. In a
    /// pan-only map a resize is applied to every other point as well so all
    /// points keep one size.
    pub fn set_crop_point(&mut self, index: usize, descriptor: &str, config: &EngineConfig) -> Result<()> {
        let limits = self.limits(config);
        let previous = self
            .crop_map
            .rect_at_index(index, self.crop_res)
            .ok_or(ClipError::IndexOutOfRange {
                index,
                len: self.crop_map.len(),
            })??;
        let next = config.crop(descriptor, self.crop_res)?;
        let next_desc = next.to_descriptor();

        if index == 0 && self.crop_map.is_static() {
            self.crop_map
                .update_all_values(|_, point| point.crop = next_desc.clone());
        } else {
            let is_resize = next.w() != previous.w || next.h() != previous.h;
            if !self.enable_zoom_pan && is_resize {
                let delta = CropRect::new(
                    next.x() - previous.x,
                    next.y() - previous.y,
                    next.w() - previous.w,
                    next.h() - previous.h,
                );
                self.shift_other_crops(index, delta, limits)?;
            }
            self.crop_map
                .update_value(index, |point| point.crop = next_desc.clone())?;
        }
        self.sync_crop();
        Ok(())
    }

    fn shift_other_crops(&mut self, except: usize, delta: CropRect, limits: CropLimits) -> Result<()> {
        let res = self.crop_res;
        let shifted = self
            .crop_map
            .iter()
            .map(|point| {
                let rect = CropRect::parse(&point.crop, res)?;
                let moved = CropRect::new(
                    rect.x + delta.x,
                    rect.y + delta.y,
                    rect.w + delta.w,
                    rect.h + delta.h,
                );
                Ok(Crop::from_rect(moved, res, limits).to_descriptor())
            })
            .collect::<Result<Vec<_>>>()?;
        self.crop_map.update_all_values(|index, point| {
            if index != except {
                point.crop = shifted[index].clone();
            }
        });
        Ok(())
    }

    pub fn toggle_crop_ease_in(&mut self, index: usize) -> Result<()> {
        self.crop_map.update_value(index, |point| point.toggle_ease_in())
    }

    /// Copy the neighbouring point's crop into `index`.
    pub fn inherit_crop_point(&mut self, index: usize, from_next: bool) -> Result<()> {
        self.crop_map.inherit_crop(index, from_next)?;
        self.sync_crop();
        Ok(())
    }

    /// Refit every crop point (except `except`) to `ratio`.
    pub fn set_crop_aspect_ratio(
        &mut self,
        ratio: f64,
        except: Option<usize>,
        config: &EngineConfig,
    ) -> Result<()> {
        let limits = self.limits(config);
        self.crop_map
            .set_aspect_ratio_for_all_points(ratio, self.crop_res, limits, except)?;
        self.sync_crop();
        Ok(())
    }

    pub fn toggle_zoom_pan(&mut self) {
        self.enable_zoom_pan = !self.enable_zoom_pan;
    }

    /// Replace the crop of a static crop map, keeping the descriptor as
    /// written (`iw`/`ih` stay symbolic). Variable maps are left alone and
    /// `false` is returned.
    pub fn set_static_crop(&mut self, descriptor: &str) -> Result<bool> {
        if !self.crop_map.is_static() {
            return Ok(false);
        }
        CropRect::parse(descriptor, self.crop_res)?;
        self.crop_map
            .update_all_values(|_, point| point.crop = descriptor.to_string());
        self.sync_crop();
        Ok(true)
    }

    /// Rescale every crop to a new working resolution.
    pub fn rescale_crops(&mut self, res: Resolution) -> Result<()> {
        let mx = res.width as f64 / self.crop_res.width as f64;
        let my = res.height as f64 / self.crop_res.height as f64;
        self.crop_map.multiply(mx, my)?;
        self.crop_res = res;
        self.sync_crop();
        Ok(())
    }
}

fn refused_delete(index: usize, len: usize) -> ClipError {
    if index < len {
        ClipError::BoundaryPoint(index)
    } else {
        ClipError::IndexOutOfRange { index, len }
    }
}

// ── Marker pair ─────────────────────────────────────────────────

/// A clip: its state, overrides, cached output duration and history.
#[derive(Debug, Clone)]
pub struct MarkerPair {
    pub id: Uuid,
    state: ClipState,
    pub overrides: SettingsLayer,
    output_duration: f64,
    fps: f64,
    history: History<ClipState>,
}

impl MarkerPair {
    pub fn new(state: ClipState, config: &EngineConfig) -> Result<Self> {
        state.validate()?;
        let fps = config.default_fps;
        let output_duration = compute_output_duration(&state.speed_map, fps)?;
        Ok(Self {
            id: Uuid::new_v4(),
            history: History::new(state.clone(), config.history_capacity),
            state,
            overrides: SettingsLayer::default(),
            output_duration,
            fps,
        })
    }

    #[inline]
    pub fn state(&self) -> &ClipState {
        &self.state
    }

    #[inline]
    pub fn output_duration(&self) -> f64 {
        self.output_duration
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn history(&self) -> &History<ClipState> {
        &self.history
    }

    /// Change the frame rate the duration is computed at.
    pub fn set_fps(&mut self, fps: f64) -> Result<()> {
        self.output_duration = compute_output_duration(&self.state.speed_map, fps)?;
        self.fps = fps;
        Ok(())
    }

    /// Run an edit against a copy of the state and commit it on success.
    /// A failed edit leaves the clip untouched.
    pub fn edit<T>(&mut self, f: impl FnOnce(&mut ClipState) -> Result<T>) -> Result<T> {
        let mut draft = self.state.clone();
        let value = f(&mut draft)?;
        draft.validate()?;
        let output_duration = compute_output_duration(&draft.speed_map, self.fps)?;
        if draft != self.state {
            self.history.push(draft.clone());
        }
        self.state = draft;
        self.output_duration = output_duration;
        Ok(value)
    }

    /// Restore the previous snapshot. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    /// Restore the next snapshot. Returns false when there is none.
    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, state: ClipState) {
        match compute_output_duration(&state.speed_map, self.fps) {
            Ok(duration) => self.output_duration = duration,
            Err(err) => warn!(%err, "keeping stale output duration after restore"),
        }
        self.state = state;
    }

    /// Replace the state wholesale (e.g. from an import) and start a fresh
    /// history from it.
    pub fn replace_state(&mut self, state: ClipState, config: &EngineConfig) -> Result<()> {
        state.validate()?;
        self.output_duration = compute_output_duration(&state.speed_map, self.fps)?;
        self.history = History::new(state.clone(), config.history_capacity);
        self.state = state;
        Ok(())
    }

    /// Overrides layered over `global`, resolved to concrete values.
    pub fn effective_settings(&self, global: &SettingsLayer) -> crate::settings::EncodeSettings {
        SettingsLayer::merge(&self.overrides, global).resolve()
    }
}
