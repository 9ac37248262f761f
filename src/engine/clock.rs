//! Transport bookkeeping: where we are in the track.
//!
//! Position is never advanced on a timer. While playing it is recomputed from
//! the last exact position, the output-clock anchor it was true at, and the
//! current output-clock time.

use super::region::LoopBounds;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportClock {
    total_duration: f64,
    is_playing: bool,
    logical_position: f64,
    anchor: Option<f64>,
    /// Bounds the running voices were started with; the fold must match them.
    bounds: LoopBounds,
}

impl TransportClock {
    pub fn new(total_duration: f64) -> Self {
        Self {
            total_duration,
            is_playing: false,
            logical_position: 0.0,
            anchor: None,
            bounds: LoopBounds::new(0.0, total_duration),
        }
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn logical_position(&self) -> f64 {
        self.logical_position
    }

    pub fn anchor(&self) -> Option<f64> {
        self.anchor
    }

    /// `at` becomes exactly true at output time `anchor`.
    pub fn mark_started(&mut self, at: f64, anchor: f64, bounds: LoopBounds) {
        self.logical_position = at;
        self.anchor = Some(anchor);
        self.bounds = bounds;
        self.is_playing = true;
    }

    /// Capture the true position at `now` and stop the clock.
    pub fn mark_stopped(&mut self, now: f64) {
        self.logical_position = self.current_position(now);
        self.anchor = None;
        self.is_playing = false;
    }

    /// Reposition while stopped.
    pub fn set_position(&mut self, at: f64) {
        self.logical_position = at;
    }

    pub fn current_position(&self, now: f64) -> f64 {
        match self.anchor {
            Some(anchor) if self.is_playing => {
                // Before the scheduled onset nothing is sounding yet.
                let raw = self.logical_position + (now - anchor).max(0.0);
                self.bounds.fold(raw)
            }
            _ => self.logical_position,
        }
    }
}
