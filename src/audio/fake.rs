//! In-memory output with a hand-driven clock, for tests.

use std::cell::Cell;
use std::rc::Rc;

use super::{AudioError, AudioOutput, Voice, VoiceRequest};

#[derive(Default)]
pub struct Counters {
    pub now: Cell<f64>,
    pub started: Cell<usize>,
    pub stopped: Cell<usize>,
    /// Voices over buffers of exactly this many frames are refused.
    pub reject_frames: Cell<Option<usize>>,
}

impl Counters {
    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

pub struct FakeVoice {
    counters: Rc<Counters>,
    pub start_at: f64,
    pub offset: f64,
    pub loop_start: f64,
    pub loop_end: f64,
    pub gain: Cell<f32>,
}

impl Voice for FakeVoice {
    fn set_gain(&self, gain: f32) {
        self.gain.set(gain);
    }

    fn stop(&mut self) {
        self.counters.stopped.set(self.counters.stopped.get() + 1);
    }

    fn start_at(&self) -> f64 {
        self.start_at
    }

    fn offset(&self) -> f64 {
        self.offset
    }

    fn elapsed(&self) -> f64 {
        (self.counters.now.get() - self.start_at).max(0.0)
    }
}

pub struct FakeOutput {
    pub counters: Rc<Counters>,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self {
            counters: Rc::new(Counters::default()),
        }
    }
}

impl AudioOutput for FakeOutput {
    type Voice = FakeVoice;

    fn now(&self) -> f64 {
        self.counters.now.get()
    }

    fn start_voice(&self, request: VoiceRequest) -> Result<FakeVoice, AudioError> {
        if self.counters.reject_frames.get() == Some(request.buffer.frames()) {
            return Err(AudioError::Voice("refused".to_string()));
        }
        self.counters.started.set(self.counters.started.get() + 1);
        Ok(FakeVoice {
            counters: self.counters.clone(),
            start_at: request.start_at,
            offset: request.offset,
            loop_start: request.loop_start,
            loop_end: request.loop_end,
            gain: Cell::new(request.gain),
        })
    }
}
