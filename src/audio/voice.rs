//! The looping PCM source a voice plays, and the rodio-backed voice handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rodio::{ChannelCount, SampleRate, Sink, Source};

use super::error::AudioError;
use super::types::{Voice, VoiceRequest};

/// Reads a shared buffer from an offset and wraps at the loop end forever.
///
/// The loop end may lie past the end of the buffer (a stem shorter than the
/// track); those frames render as silence so every stem wraps on the same
/// frame.
pub(crate) struct LoopingSource {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
    buffer_frames: usize,
    loop_start: usize,
    loop_end: usize,
    frame: usize,
    channel: u16,
    rendered: Arc<AtomicU64>,
}

impl LoopingSource {
    pub(crate) fn new(request: &VoiceRequest, rendered: Arc<AtomicU64>) -> Result<Self, AudioError> {
        let buffer = &request.buffer;
        let rate = buffer.sample_rate() as f64;
        let to_frame = |secs: f64| (secs.max(0.0) * rate).round() as usize;

        let loop_start = to_frame(request.loop_start);
        let loop_end = to_frame(request.loop_end);
        if loop_end <= loop_start {
            return Err(AudioError::Voice(format!(
                "empty loop [{:.3}, {:.3})",
                request.loop_start, request.loop_end
            )));
        }

        let mut frame = to_frame(request.offset);
        if frame < loop_start || frame >= loop_end {
            frame = loop_start;
        }

        Ok(Self {
            samples: buffer.samples().clone(),
            channels: buffer.channels(),
            sample_rate: buffer.sample_rate(),
            buffer_frames: buffer.frames(),
            loop_start,
            loop_end,
            frame,
            channel: 0,
            rendered,
        })
    }
}

impl Iterator for LoopingSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = if self.frame < self.buffer_frames {
            self.samples[self.frame * self.channels as usize + self.channel as usize]
        } else {
            0.0
        };

        self.channel += 1;
        if self.channel == self.channels {
            self.channel = 0;
            self.frame += 1;
            self.rendered.fetch_add(1, Ordering::Relaxed);
            if self.frame >= self.loop_end {
                self.frame = self.loop_start;
            }
        }

        Some(sample)
    }
}

impl Source for LoopingSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> ChannelCount {
        self.channels
    }

    fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// One rodio sink carrying exactly one looping source.
pub struct RodioVoice {
    sink: Sink,
    rendered: Arc<AtomicU64>,
    sample_rate: u32,
    start_at: f64,
    offset: f64,
}

impl RodioVoice {
    pub(crate) fn new(sink: Sink, rendered: Arc<AtomicU64>, request: &VoiceRequest) -> Self {
        Self {
            sink,
            rendered,
            sample_rate: request.buffer.sample_rate(),
            start_at: request.start_at,
            offset: request.offset,
        }
    }
}

impl Voice for RodioVoice {
    fn set_gain(&self, gain: f32) {
        self.sink.set_volume(gain);
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn start_at(&self) -> f64 {
        self.start_at
    }

    fn offset(&self) -> f64 {
        self.offset
    }

    fn elapsed(&self) -> f64 {
        self.rendered.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }
}
