//! Clip sessions: every marker pair of one video plus the global settings.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use clipmark_core::{
    defaults, format_hhmmss_trimmed, multiply_descriptor, ClipError, CropRect, EngineConfig,
    FrameRate, Resolution, Result,
};

use crate::marker_pair::{ClipState, MarkerPair};
use crate::settings::{EncodeSettings, SettingsLayer};

/// Session-wide settings. Encode fields live in a flattened layer that
/// marker-pair overrides merge over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettings {
    #[serde(rename = "videoID")]
    pub video_id: String,
    pub video_title: String,
    /// Speed given to newly added marker pairs.
    pub new_marker_speed: f64,
    /// Crop given to newly added marker pairs.
    pub new_marker_crop: String,
    pub title_suffix: String,
    pub is_vertical_video: bool,
    pub crop_res: Resolution,
    /// Groups of 1-based marker-pair numbers, e.g. `1-3,5;2`.
    pub marker_pair_merge_list: String,
    #[serde(flatten)]
    pub encode: SettingsLayer,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            video_id: String::new(),
            video_title: String::new(),
            new_marker_speed: 1.0,
            new_marker_crop: defaults::FULL_CROP.to_string(),
            title_suffix: String::new(),
            is_vertical_video: false,
            crop_res: Resolution::HD_1080,
            marker_pair_merge_list: String::new(),
            encode: SettingsLayer::default(),
        }
    }
}

impl GlobalSettings {
    pub fn for_video(video_id: impl Into<String>, is_vertical_video: bool) -> Self {
        let video_id = video_id.into();
        Self {
            title_suffix: format!("[{}]", video_id),
            video_id,
            is_vertical_video,
            crop_res: if is_vertical_video {
                Resolution::new(1080, 1920)
            } else {
                Resolution::HD_1080
            },
            ..Default::default()
        }
    }
}

/// The marker pairs of one video, in numbering order.
#[derive(Debug, Clone)]
pub struct ClipSession {
    config: EngineConfig,
    pub settings: GlobalSettings,
    marker_pairs: Vec<MarkerPair>,
}

impl ClipSession {
    pub fn new(config: EngineConfig, settings: GlobalSettings) -> Self {
        Self {
            config,
            settings,
            marker_pairs: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn marker_pairs(&self) -> &[MarkerPair] {
        &self.marker_pairs
    }

    pub fn len(&self) -> usize {
        self.marker_pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marker_pairs.is_empty()
    }

    // ── Marker pairs ────────────────────────────────────────────

    /// Add a marker pair over `[start, end]` using the new-marker speed and
    /// crop. Returns its id.
    pub fn add_marker_pair(&mut self, start: f64, end: f64) -> Result<Uuid> {
        let rounding = self.config.time_rounding;
        let speed = self.config.normalize_speed(self.settings.new_marker_speed);
        let state = ClipState::new(
            rounding.round(start),
            rounding.round(end),
            speed,
            &self.settings.new_marker_crop,
            self.settings.crop_res,
        )?;
        CropRect::parse(&state.crop, state.crop_res)?;
        let pair = MarkerPair::new(state, &self.config)?;
        let id = pair.id;
        debug!(%id, start, end, number = self.marker_pairs.len() + 1, "added marker pair");
        self.marker_pairs.push(pair);
        Ok(id)
    }

    /// Append an already-built marker pair.
    pub fn push_marker_pair(&mut self, pair: MarkerPair) {
        self.marker_pairs.push(pair);
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.marker_pairs.iter().position(|p| p.id == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&MarkerPair> {
        self.marker_pairs.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut MarkerPair> {
        self.marker_pairs.iter_mut().find(|p| p.id == id)
    }

    pub fn delete(&mut self, id: Uuid) -> Option<MarkerPair> {
        let index = self.index_of(id)?;
        debug!(%id, number = index + 1, "deleted marker pair");
        Some(self.marker_pairs.remove(index))
    }

    /// Run [`MarkerPair::edit`] on the pair with `id`.
    pub fn edit<T>(
        &mut self,
        id: Uuid,
        f: impl FnOnce(&mut ClipState, &EngineConfig) -> Result<T>,
    ) -> Result<T> {
        let config = &self.config;
        let pair = self
            .marker_pairs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClipError::parameter(format!("no marker pair with id {}", id)))?;
        pair.edit(|state| f(state, config))
    }

    /// Recompute every output duration at a new frame rate.
    pub fn set_fps(&mut self, fps: f64) -> Result<()> {
        for pair in &mut self.marker_pairs {
            pair.set_fps(fps)?;
        }
        Ok(())
    }

    /// [`Self::set_fps`] from a rational frame rate.
    pub fn set_frame_rate(&mut self, rate: FrameRate) -> Result<()> {
        self.set_fps(rate.to_fps_f64())
    }

    /// Encode settings for one pair: its overrides over the global layer.
    pub fn effective_settings(&self, id: Uuid) -> Option<EncodeSettings> {
        self.get(id)
            .map(|pair| pair.effective_settings(&self.settings.encode))
    }

    // ── Session-wide updates ────────────────────────────────────

    /// Set the speed of every pair and of new pairs. Static speed maps
    /// follow the new speed; variable ones only change their first point.
    pub fn update_all_speeds(&mut self, speed: f64) -> Result<()> {
        let speed = self.config.normalize_speed(speed);
        self.settings.new_marker_speed = speed;
        for pair in &mut self.marker_pairs {
            let config = &self.config;
            pair.edit(|state| {
                state.set_speed(speed, config);
                Ok(())
            })?;
        }
        debug!(speed, pairs = self.marker_pairs.len(), "updated all speeds");
        Ok(())
    }

    /// Set the crop of new pairs and of every pair whose crop map is static.
    /// Returns how many pairs changed.
    pub fn update_all_crops(&mut self, descriptor: &str) -> Result<usize> {
        CropRect::parse(descriptor, self.settings.crop_res)?;
        self.settings.new_marker_crop = descriptor.to_string();
        let mut updated = 0;
        for pair in &mut self.marker_pairs {
            if pair.edit(|state| state.set_static_crop(descriptor))? {
                updated += 1;
            }
        }
        debug!(descriptor, updated, "updated all static crops");
        Ok(updated)
    }

    /// Scale the new-marker crop and every crop point of every pair.
    pub fn multiply_all_crops(&mut self, multiple_x: f64, multiple_y: f64) -> Result<()> {
        self.settings.new_marker_crop =
            multiply_descriptor(multiple_x, multiple_y, &self.settings.new_marker_crop)?;
        for pair in &mut self.marker_pairs {
            pair.edit(|state| {
                state.crop_map.multiply(multiple_x, multiple_y)?;
                state.crop = state.crop_map.first().crop.clone();
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Change the working resolution, rescaling every crop to match.
    pub fn set_crop_res(&mut self, res: Resolution) -> Result<()> {
        let prev = self.settings.crop_res;
        if prev == res {
            return Ok(());
        }
        if res.width == 0 || res.height == 0 {
            return Err(ClipError::InvalidResolution(res.to_string()));
        }
        let multiple_x = res.width as f64 / prev.width as f64;
        let multiple_y = res.height as f64 / prev.height as f64;
        let new_marker_crop =
            multiply_descriptor(multiple_x, multiple_y, &self.settings.new_marker_crop)?;

        // Nothing is committed unless every pair rescales.
        let rescaled = self
            .marker_pairs
            .iter()
            .map(|pair| -> Result<ClipState> {
                let mut state = pair.state().clone();
                state.rescale_crops(res)?;
                state.validate()?;
                Ok(state)
            })
            .collect::<Result<Vec<_>>>()?;
        for (pair, state) in self.marker_pairs.iter_mut().zip(rescaled) {
            pair.edit(|current| {
                *current = state;
                Ok(())
            })?;
        }
        self.settings.new_marker_crop = new_marker_crop;
        self.settings.crop_res = res;
        debug!(%prev, %res, "changed crop resolution");
        Ok(())
    }

    // ── Merge list ──────────────────────────────────────────────

    /// Summed input duration over speed for each merge group of `list`.
    ///
    /// Groups are separated by `;` and items by `,`. An item is a 1-based
    /// pair number or an inclusive range `a-b` (either order). Numbers that
    /// do not name a pair are skipped.
    pub fn merge_list_durations(&self, list: &str) -> Vec<f64> {
        list.split(';')
            .map(|group| {
                group
                    .split(',')
                    .flat_map(|item| self.merge_item_indices(item))
                    .map(|index| {
                        let state = self.marker_pairs[index].state();
                        (state.end - state.start) / state.speed
                    })
                    .sum()
            })
            .collect()
    }

    /// [`Self::merge_list_durations`] of the session's own merge list,
    /// formatted as trimmed timestamps joined by ` ; `.
    pub fn merge_list_summary(&self) -> String {
        let durations = self.merge_list_durations(&self.settings.marker_pair_merge_list);
        trace!(groups = durations.len(), "summarised merge list");
        durations
            .into_iter()
            .map(format_hhmmss_trimmed)
            .collect::<Vec<_>>()
            .join(" ; ")
    }

    fn merge_item_indices(&self, item: &str) -> Vec<usize> {
        let len = self.marker_pairs.len() as i64;
        let (lo, hi) = if item.contains('-') {
            let mut ends = item.split('-').map(parse_leading_int);
            match (ends.next().flatten(), ends.next().flatten()) {
                (Some(a), Some(b)) => (a.min(b) - 1, a.max(b) - 1),
                _ => return Vec::new(),
            }
        } else {
            match parse_leading_int(item) {
                Some(n) => (n - 1, n - 1),
                None => return Vec::new(),
            }
        };
        (lo.max(0)..=hi.min(len - 1))
            .map(|index| index as usize)
            .collect()
    }
}

/// Leading integer of `s` after optional whitespace and sign, ignoring any
/// trailing text. `None` when there are no digits.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}
