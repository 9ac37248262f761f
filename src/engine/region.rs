//! A-B loop markers and the bounds playback actually wraps within.

use super::error::{EngineError, Result};

/// Minimum gap kept between loop markers while dragging, and the offset the
/// start marker resets to when looping is switched off.
pub const LOOP_EPSILON: f64 = 0.01;

/// The `[start, end)` range voices wrap within.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoopBounds {
    pub start: f64,
    pub end: f64,
}

impl LoopBounds {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Out-of-range positions snap to the loop start.
    pub fn clamp(&self, t: f64) -> f64 {
        if self.contains(t) { t } else { self.start }
    }

    /// Snap both ends onto the `1 / sample_rate` grid voices loop on, keeping
    /// at least one frame between them.
    pub fn snap(self, sample_rate: u32) -> Self {
        if sample_rate == 0 {
            return self;
        }
        let rate = sample_rate as f64;
        let start = (self.start.max(0.0) * rate).round();
        let end = (self.end * rate).round().max(start + 1.0);
        Self::new(start / rate, end / rate)
    }

    /// Fold a free-running position back into the bounds, matching how a
    /// voice wraps from `end` to `start`.
    pub fn fold(&self, raw: f64) -> f64 {
        let len = self.end - self.start;
        if len <= 0.0 {
            return self.start;
        }
        if raw >= self.end {
            self.start + (raw - self.end).rem_euclid(len)
        } else {
            raw
        }
    }
}

/// User-editable A-B loop. Markers are a draft: inverted values are stored
/// and reported, and the region is treated as disabled until they are fixed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoopRegion {
    pub enabled: bool,
    pub start: f64,
    pub end: f64,
}

impl LoopRegion {
    /// A disabled region spanning the whole track.
    pub fn whole_track(total: f64) -> Self {
        Self {
            enabled: false,
            start: 0.0,
            end: total,
        }
    }

    pub fn is_valid(&self, total: f64) -> bool {
        self.start >= 0.0 && self.start < self.end && self.end <= total
    }

    pub fn validate(&self, total: f64) -> Result<()> {
        if self.is_valid(total) {
            Ok(())
        } else {
            Err(EngineError::InvalidLoopRegion {
                start: self.start,
                end: self.end,
            })
        }
    }

    pub fn is_active(&self, total: f64) -> bool {
        self.enabled && self.is_valid(total)
    }

    /// The bounds voices should loop within: the region when active, the
    /// whole track otherwise.
    pub fn bounds(&self, total: f64) -> LoopBounds {
        if self.is_active(total) {
            LoopBounds::new(self.start, self.end)
        } else {
            LoopBounds::new(0.0, total)
        }
    }

    /// Reset to a whole-track loop starting just past zero.
    pub fn reset(&mut self, total: f64) {
        self.start = if total > LOOP_EPSILON { LOOP_EPSILON } else { 0.0 };
        self.end = total;
    }

    /// Move the start handle, keeping it at least `LOOP_EPSILON` before the end.
    pub fn drag_start(&mut self, t: f64) {
        self.start = t.min(self.end - LOOP_EPSILON).max(0.0);
    }

    /// Move the end handle, keeping it at least `LOOP_EPSILON` after the start.
    pub fn drag_end(&mut self, t: f64, total: f64) {
        self.end = t.max(self.start + LOOP_EPSILON).min(total);
    }
}
