//! Audio-related small types and the output/voice seams.
//!
//! `PcmBuffer` is the decoded, immutable stem audio. `AudioOutput` is the
//! process-wide output graph; `Voice` is a single-use playback handle it hands
//! out for one scheduled run over a buffer.

use std::sync::Arc;

use super::error::AudioError;

/// Decoded interleaved PCM for one stem. Cloning shares the samples.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of whole frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Everything a voice needs to start: what to read, where, and when.
///
/// Times are seconds. `start_at` is on the output's clock (see
/// [`AudioOutput::now`]); `offset`, `loop_start` and `loop_end` are track
/// positions. The voice wraps from `loop_end` back to `loop_start` natively.
#[derive(Debug, Clone)]
pub struct VoiceRequest {
    pub buffer: PcmBuffer,
    pub offset: f64,
    pub loop_start: f64,
    pub loop_end: f64,
    pub start_at: f64,
    pub gain: f32,
}

/// A single-use playback instance. It can be stopped but never restarted or
/// repositioned; a new one is requested instead.
pub trait Voice {
    /// Apply a gain immediately, without restarting the voice.
    fn set_gain(&self, gain: f32);
    /// Silence the voice for good.
    fn stop(&mut self);
    /// Output-clock time at which the voice begins sounding.
    fn start_at(&self) -> f64;
    /// Track position the voice started reading from.
    fn offset(&self) -> f64;
    /// Seconds of audio rendered since onset.
    fn elapsed(&self) -> f64;
}

/// The hardware output graph every voice connects to.
pub trait AudioOutput {
    type Voice: Voice;

    /// Monotonic output clock in seconds.
    fn now(&self) -> f64;

    /// Create and schedule a voice.
    fn start_voice(&self, request: VoiceRequest) -> Result<Self::Voice, AudioError>;
}
