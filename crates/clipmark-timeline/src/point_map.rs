//! Sorted, time-keyed point sequences.
//!
//! A [`PointMap`] always holds at least two points, sorted by time with no
//! duplicate times. The first and last points sit on the clip's start and end.
//! Editing focus (the "current section") lives outside the map in a
//! [`SectionCursor`] that callers pass in explicitly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use tracing::{debug, trace};

use clipmark_core::{ClipError, Result};

use crate::point::MapPoint;

/// Which clip boundary an operation acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Start,
    End,
}

/// An ordered sequence of at least two points.
#[derive(Debug, Clone, PartialEq)]
pub struct PointMap<P> {
    points: SmallVec<[P; 4]>,
}

impl<P: MapPoint> PointMap<P> {
    /// Build a map from arbitrary points. Points are sorted by time; a later
    /// point with the same time replaces an earlier one.
    pub fn new(points: impl IntoIterator<Item = P>) -> Result<Self> {
        let mut points: SmallVec<[P; 4]> = points.into_iter().collect();
        if let Some(bad) = points.iter().find(|p| !p.time().is_finite()) {
            return Err(ClipError::point_map(format!(
                "non-finite point time {}",
                bad.time()
            )));
        }
        // Stable sort keeps insertion order among equal times, so the dedup
        // below keeps the last one.
        points.sort_by(|a, b| a.time().total_cmp(&b.time()));
        let mut deduped: SmallVec<[P; 4]> = SmallVec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.time() == point.time() => *last = point,
                _ => deduped.push(point),
            }
        }
        if deduped.len() < 2 {
            return Err(ClipError::point_map(format!(
                "a map needs at least 2 points with distinct times, got {}",
                deduped.len()
            )));
        }
        Ok(Self { points: deduped })
    }

    /// The two-point map spanning `[start, end]`.
    pub fn boundaries(start: P, end: P) -> Result<Self> {
        if start.time() >= end.time() {
            return Err(ClipError::InvalidBoundary(format!(
                "start {} must precede end {}",
                start.time(),
                end.time()
            )));
        }
        Self::new([start, end])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for the usual container API.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[P] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.points.iter()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&P> {
        self.points.get(index)
    }

    #[inline]
    pub fn first(&self) -> &P {
        &self.points[0]
    }

    #[inline]
    pub fn last(&self) -> &P {
        &self.points[self.points.len() - 1]
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.first().time()
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.last().time()
    }

    /// Whether `index` is the first or last point.
    #[inline]
    pub fn is_boundary(&self, index: usize) -> bool {
        index == 0 || index == self.points.len() - 1
    }

    /// Two points with equal values.
    pub fn is_static(&self) -> bool {
        self.points.len() == 2 && self.points[0].same_value(&self.points[1])
    }

    /// Whether any adjacent pair differs in value.
    pub fn is_variable(&self) -> bool {
        self.points.windows(2).any(|w| !w[0].same_value(&w[1]))
    }

    /// Mutate the value of a point. The point's time is restored afterwards
    /// so ordering cannot break.
    pub fn update_value(&mut self, index: usize, f: impl FnOnce(&mut P)) -> Result<()> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(ClipError::IndexOutOfRange { index, len })?;
        let time = point.time();
        f(point);
        point.set_time(time);
        Ok(())
    }

    /// Apply `f` to every point's value.
    pub fn update_all_values(&mut self, mut f: impl FnMut(usize, &mut P)) {
        for (index, point) in self.points.iter_mut().enumerate() {
            let time = point.time();
            f(index, point);
            point.set_time(time);
        }
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Bracketing indices for `t`: `(i, i)` on an exact hit, otherwise the
    /// points on either side. Times before the start or after the end clamp
    /// to the first or last point. NaN never panics; it lands in the first
    /// or last section depending on its sign bit.
    pub fn lookup(&self, t: f64) -> (usize, usize) {
        let last = self.points.len() - 1;
        if t <= self.start() {
            return (0, 0);
        }
        if t >= self.end() {
            return (last, last);
        }
        match self.points.binary_search_by(|p| p.time().total_cmp(&t)) {
            Ok(i) => (i, i),
            Err(insert_at) => {
                let hi = insert_at.clamp(1, last);
                (hi - 1, hi)
            }
        }
    }

    /// The section `[i, i + 1]` that contains `t`. Exact hits on an interior
    /// point resolve to the section that starts there.
    pub fn section_at(&self, t: f64) -> (usize, usize) {
        let (lo, _) = self.lookup(t);
        let left = lo.min(self.points.len() - 2);
        (left, left + 1)
    }

    // ── Insert / delete ─────────────────────────────────────────

    /// Insert a point keeping the map sorted. A point at an existing time
    /// replaces that point. Returns the index of the inserted point.
    pub fn insert(&mut self, point: P) -> Result<usize> {
        let time = point.time();
        if !(self.start()..=self.end()).contains(&time) {
            return Err(ClipError::TimeOutOfBounds {
                time,
                start: self.start(),
                end: self.end(),
            });
        }
        let index = match self.points.binary_search_by(|p| p.time().total_cmp(&time)) {
            Ok(existing) => {
                self.points[existing] = point;
                existing
            }
            Err(position) => {
                self.points.insert(position, point);
                position
            }
        };
        trace!(index, time, len = self.points.len(), "inserted map point");
        Ok(index)
    }

    /// Remove an interior point. Boundary points and out-of-range indices
    /// are refused with `None`.
    pub fn delete(&mut self, index: usize) -> Option<P> {
        if index >= self.points.len() || self.is_boundary(index) {
            return None;
        }
        let removed = self.points.remove(index);
        trace!(index, len = self.points.len(), "deleted map point");
        Some(removed)
    }

    /// Like [`Self::delete`], keeping `cursor` on a valid adjacent section.
    pub fn delete_with_cursor(&mut self, index: usize, cursor: &mut SectionCursor) -> Option<P> {
        let removed = self.delete(index)?;
        if cursor.point >= index {
            cursor.point = cursor.point.saturating_sub(1);
        }
        cursor.clamp_to(self.points.len());
        Some(removed)
    }

    // ── Boundary moves ──────────────────────────────────────────

    /// Move a boundary outward to `t`.
    ///
    /// A static boundary section just moves its boundary point. A dynamic one
    /// keeps its shape: a new boundary point carrying the old boundary value
    /// is added at `t`.
    pub fn stretch(&mut self, t: f64, side: Side) -> Result<()> {
        let outward = match side {
            Side::Start => t <= self.start(),
            Side::End => t >= self.end(),
        };
        if !outward || !t.is_finite() {
            return Err(ClipError::InvalidBoundary(format!(
                "cannot stretch {:?} boundary of [{}, {}] to {}",
                side,
                self.start(),
                self.end(),
                t
            )));
        }
        let (boundary, inner) = self.boundary_pair(side);
        if self.points[boundary].time() == t {
            return Ok(());
        }

        if self.points[boundary].same_value(&self.points[inner]) {
            debug!(?side, t, "stretching static boundary section");
            self.points[boundary].set_time(t);
        } else {
            debug!(?side, t, "stretching dynamic boundary section");
            let point = self.points[boundary].relocated(t);
            match side {
                Side::Start => self.points.insert(0, point),
                Side::End => self.points.push(point),
            }
        }
        Ok(())
    }

    /// Move a boundary inward to `t`.
    ///
    /// Points beyond `t` are dropped. Unless `t` hits a point exactly, the
    /// surviving point of the section containing `t` becomes the new boundary
    /// with the value `interpolate(left, right, t)` yields there.
    pub fn shrink_with(
        &mut self,
        t: f64,
        side: Side,
        interpolate: impl FnOnce(&P, &P, f64) -> Result<P>,
    ) -> Result<()> {
        if !(self.start() < t && t < self.end()) {
            return Err(ClipError::InvalidBoundary(format!(
                "cannot shrink {:?} boundary of [{}, {}] to {}",
                side,
                self.start(),
                self.end(),
                t
            )));
        }

        let (lo, hi) = self.lookup(t);
        if lo == hi {
            debug!(?side, t, index = lo, "shrinking onto existing point");
            match side {
                Side::Start => {
                    self.points.drain(..lo);
                }
                Side::End => self.points.truncate(lo + 1),
            }
            return Ok(());
        }

        let mut boundary = interpolate(&self.points[lo], &self.points[hi], t)?;
        boundary.set_time(t);
        debug!(?side, t, lo, hi, "shrinking into section");
        match side {
            Side::Start => {
                self.points[lo] = boundary;
                self.points.drain(..lo);
            }
            Side::End => {
                self.points[hi] = boundary;
                self.points.truncate(hi + 1);
            }
        }
        Ok(())
    }

    /// `(boundary, neighbour)` indices for a side.
    fn boundary_pair(&self, side: Side) -> (usize, usize) {
        let last = self.points.len() - 1;
        match side {
            Side::Start => (0, 1),
            Side::End => (last, last - 1),
        }
    }
}

impl<'a, P> IntoIterator for &'a PointMap<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<P: Serialize> Serialize for PointMap<P> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.points.serialize(serializer)
    }
}

impl<'de, P: MapPoint + Deserialize<'de>> Deserialize<'de> for PointMap<P> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let points = SmallVec::<[P; 4]>::deserialize(deserializer)?;
        Self::new(points).map_err(serde::de::Error::custom)
    }
}

// ── Section cursor ──────────────────────────────────────────────

/// Which end of the current section the cursor's point is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionMode {
    #[default]
    Start,
    End,
}

/// Editing focus within a map: a current point and the section it anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionCursor {
    pub point: usize,
    pub mode: SectionMode,
}

impl SectionCursor {
    pub fn new(point: usize, mode: SectionMode) -> Self {
        Self { point, mode }
    }

    /// The section `(left, right)` for a map of `len` points.
    pub fn section(&self, len: usize) -> (usize, usize) {
        let last = len.saturating_sub(1).max(1);
        match self.mode {
            SectionMode::Start => {
                let left = self.point.min(last - 1);
                (left, left + 1)
            }
            SectionMode::End => {
                let right = self.point.clamp(1, last);
                (right - 1, right)
            }
        }
    }

    /// Keep the point inside a map of `len` points.
    pub fn clamp_to(&mut self, len: usize) {
        self.point = self.point.min(len.saturating_sub(1));
    }

    /// Move the cursor to the section containing `t`. At an exact hit the
    /// cursor stays on the current section rather than jumping past it.
    pub fn follow_time<P: MapPoint>(&mut self, map: &PointMap<P>, t: f64) {
        let len = map.len();
        let (current_left, current_right) = self.section(len);
        let (mut lo, mut hi) = map.lookup(t);
        match self.mode {
            SectionMode::Start => {
                if lo == hi && hi == current_right {
                    lo = lo.saturating_sub(1);
                }
                self.point = lo.min(len - 2);
            }
            SectionMode::End => {
                if lo == hi && lo == current_left {
                    hi += 1;
                }
                self.point = hi.clamp(1, len - 1);
            }
        }
    }
}
