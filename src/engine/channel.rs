use crate::audio::{AudioError, AudioOutput, PcmBuffer, Voice, VoiceRequest};

use super::region::LoopBounds;

/// One stem: its decoded buffer, fader state and at most one live voice.
pub struct StemChannel<V: Voice> {
    name: String,
    source_url: String,
    buffer: Option<PcmBuffer>,
    load_error: Option<String>,
    gain: f32,
    muted: bool,
    voice: Option<V>,
}

impl<V: Voice> StemChannel<V> {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>, gain: f32) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            buffer: None,
            load_error: None,
            gain: gain.clamp(0.0, 1.0),
            muted: false,
            voice: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn buffer(&self) -> Option<&PcmBuffer> {
        self.buffer.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn voice(&self) -> Option<&V> {
        self.voice.as_ref()
    }

    pub fn is_sounding(&self) -> bool {
        self.voice.is_some()
    }

    /// Loaded and not excluded by a load error.
    pub fn is_playable(&self) -> bool {
        self.buffer.is_some() && self.load_error.is_none()
    }

    /// Always derived, never stored.
    pub fn effective_gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.gain }
    }

    pub(crate) fn set_loaded(&mut self, result: Result<PcmBuffer, AudioError>) {
        match result {
            Ok(buffer) => {
                self.buffer = Some(buffer);
                self.load_error = None;
            }
            Err(e) => {
                self.buffer = None;
                self.load_error = Some(e.to_string());
            }
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.gain = volume.clamp(0.0, 1.0);
        self.apply_gain();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_gain();
    }

    fn apply_gain(&self) {
        if let Some(voice) = &self.voice {
            voice.set_gain(self.effective_gain());
        }
    }

    /// Replace any live voice with a fresh one reading from `position`
    /// (snapped into `bounds`), scheduled to sound at output time `start_at`.
    pub fn start_voice<O>(&mut self, output: &O, position: f64, bounds: LoopBounds, start_at: f64) -> Result<(), AudioError>
    where
        O: AudioOutput<Voice = V>,
    {
        self.stop_voice();

        let Some(buffer) = self.buffer.clone() else {
            return Err(AudioError::Voice(format!("stem '{}' has no audio", self.name)));
        };

        let voice = output.start_voice(VoiceRequest {
            buffer,
            offset: bounds.clamp(position),
            loop_start: bounds.start,
            loop_end: bounds.end,
            start_at,
            gain: self.effective_gain(),
        })?;
        self.voice = Some(voice);
        Ok(())
    }

    pub fn stop_voice(&mut self) {
        if let Some(mut voice) = self.voice.take() {
            voice.stop();
        }
    }
}
