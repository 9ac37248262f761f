//! The playback engine: one session's channels driven against one transport.
//!
//! Every transport change (play, seek, loop restart) tears down all voices and
//! starts fresh ones against a single shared output-clock time, so stems never
//! drift relative to each other.

use crate::audio::{AudioError, AudioOutput, LoadOutcome, LoadRequest, StemSource, Voice};

use super::channel::StemChannel;
use super::clock::TransportClock;
use super::error::{EngineError, Result};
use super::region::{LoopBounds, LoopRegion};
use super::types::{EngineSnapshot, EngineState, LoopSnapshot, StemSnapshot, TrackSession};

/// Tunables for the engine.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EngineOptions {
    /// Seconds between issuing a start and the shared onset of all voices.
    pub schedule_lead: f64,
    /// Initial fader value for every stem.
    pub default_volume: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            schedule_lead: 0.05,
            default_volume: 0.8,
        }
    }
}

pub struct PlaybackEngine<O: AudioOutput> {
    output: O,
    options: EngineOptions,
    generation: u64,
    state: EngineState,
    session: Option<TrackSession>,
    channels: Vec<StemChannel<O::Voice>>,
    clock: TransportClock,
    region: LoopRegion,
    /// Frame grid every voice of the session loops on.
    sample_rate: Option<u32>,
    last_error: Option<EngineError>,
}

impl<O: AudioOutput> PlaybackEngine<O> {
    pub fn new(output: O, options: EngineOptions) -> Self {
        Self {
            output,
            options,
            generation: 0,
            state: EngineState::Idle,
            session: None,
            channels: Vec::new(),
            clock: TransportClock::new(0.0),
            region: LoopRegion::whole_track(0.0),
            sample_rate: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == EngineState::Playing
    }

    pub fn session(&self) -> Option<&TrackSession> {
        self.session.as_ref()
    }

    pub fn channels(&self) -> &[StemChannel<O::Voice>] {
        &self.channels
    }

    pub fn loop_region(&self) -> LoopRegion {
        self.region
    }

    pub fn total_duration(&self) -> f64 {
        self.clock.total_duration()
    }

    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    /// Take over the output for a new session. Any previous session's voices
    /// are stopped first. The returned request must be loaded and handed back
    /// through [`apply_load`](Self::apply_load).
    pub fn open_session<F>(&mut self, session: TrackSession, resolve_url: F) -> LoadRequest
    where
        F: Fn(&str) -> String,
    {
        self.close_session();

        let stems: Vec<StemSource> = session
            .stem_names()
            .iter()
            .map(|name| StemSource {
                name: name.clone(),
                url: resolve_url(name),
            })
            .collect();

        self.channels = stems
            .iter()
            .map(|s| StemChannel::new(s.name.clone(), s.url.clone(), self.options.default_volume))
            .collect();

        log::info!(
            "opening session '{}' ({} stems, generation {})",
            session.source_id(),
            stems.len(),
            self.generation
        );
        self.session = Some(session);
        self.state = EngineState::Loading;

        LoadRequest {
            generation: self.generation,
            stems,
        }
    }

    /// Install loaded stems. Outcomes from an older session are ignored and
    /// `false` is returned.
    pub fn apply_load(&mut self, outcome: LoadOutcome) -> bool {
        if outcome.generation != self.generation || self.state != EngineState::Loading {
            log::debug!(
                "ignoring stale load (generation {}, current {})",
                outcome.generation,
                self.generation
            );
            return false;
        }

        for (name, result) in outcome.results {
            if let Some(channel) = self.channels.iter_mut().find(|c| c.name() == name) {
                channel.set_loaded(result);
            }
        }

        // Stems of one session must share a frame grid or their loops drift apart.
        let session_rate = self
            .channels
            .iter()
            .filter(|c| c.is_playable())
            .find_map(|c| c.buffer().map(|b| b.sample_rate()));
        if let Some(expected) = session_rate {
            for channel in &mut self.channels {
                let found = channel.buffer().map(|b| b.sample_rate());
                if let Some(found) = found.filter(|&r| r != expected) {
                    channel.set_loaded(Err(AudioError::SampleRateMismatch { found, expected }));
                }
            }
        }
        self.sample_rate = session_rate;
        for err in self.load_errors() {
            log::warn!("{err}");
        }

        let total = self
            .channels
            .iter()
            .filter(|c| c.is_playable())
            .filter_map(|c| c.buffer().map(|b| b.duration()))
            .fold(0.0, f64::max);

        self.clock = TransportClock::new(total);
        self.region = LoopRegion::whole_track(total);
        self.state = EngineState::Ready;

        let playable = self.channels.iter().filter(|c| c.is_playable()).count();
        if playable == 0 {
            log::warn!("no stem loaded; playback disabled for this session");
            self.last_error = Some(EngineError::AllStemsFailed);
        } else {
            log::info!(
                "session ready: {playable}/{} stems, {total:.2}s",
                self.channels.len()
            );
        }
        true
    }

    /// Stop everything and release the session. Loads still in flight for it
    /// will be ignored.
    pub fn close_session(&mut self) {
        self.stop_all();
        self.generation += 1;
        if let Some(session) = self.session.take() {
            log::info!("closed session '{}'", session.source_id());
        }
        self.channels.clear();
        self.clock = TransportClock::new(0.0);
        self.region = LoopRegion::whole_track(0.0);
        self.sample_rate = None;
        self.state = EngineState::Idle;
        self.last_error = None;
    }

    /// One `StemLoad` error per stem excluded from this session.
    pub fn load_errors(&self) -> Vec<EngineError> {
        self.channels
            .iter()
            .filter_map(|c| {
                c.load_error().map(|reason| EngineError::StemLoad {
                    stem: c.name().to_string(),
                    reason: reason.to_string(),
                })
            })
            .collect()
    }

    /// The bounds voices will loop within, on the session's frame grid.
    fn bounds(&self) -> LoopBounds {
        let bounds = self.region.bounds(self.clock.total_duration());
        match self.sample_rate {
            Some(rate) => bounds.snap(rate),
            None => bounds,
        }
    }

    fn snap_to_frame(&self, t: f64) -> f64 {
        match self.sample_rate {
            Some(rate) if rate > 0 => (t * rate as f64).round() / rate as f64,
            _ => t,
        }
    }

    pub fn current_position(&self) -> f64 {
        self.clock.current_position(self.output.now())
    }

    pub fn play(&mut self) -> Result<()> {
        match self.state {
            EngineState::Ready => {}
            EngineState::Playing => return Ok(()),
            other => return Err(EngineError::NotReady(other)),
        }

        if !self.channels.iter().any(|c| c.is_playable()) {
            self.last_error = Some(EngineError::AllStemsFailed);
            return Err(EngineError::AllStemsFailed);
        }

        let position = self.bounds().clamp(self.clock.logical_position());
        self.start_all(position)
    }

    pub fn pause(&mut self) {
        if self.state != EngineState::Playing {
            return;
        }
        // Capture the position before anything goes silent.
        self.clock.mark_stopped(self.output.now());
        let rendered: Vec<f64> = self.channels.iter().filter_map(|c| c.voice()).map(|v| v.elapsed()).collect();
        if let (Some(min), Some(max)) = (
            rendered.iter().copied().reduce(f64::min),
            rendered.iter().copied().reduce(f64::max),
        ) {
            log::debug!("voice spread at pause: {:.2} ms", (max - min) * 1000.0);
        }
        self.stop_all();
        self.state = EngineState::Ready;
        log::debug!("paused at {:.3}s", self.clock.logical_position());
    }

    pub fn toggle_play(&mut self) -> Result<()> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    pub fn seek(&mut self, time: f64) -> Result<()> {
        if !matches!(self.state, EngineState::Ready | EngineState::Playing) {
            return Err(EngineError::NotReady(self.state));
        }

        let total = self.clock.total_duration();
        let mut target = if time.is_nan() { 0.0 } else { time.clamp(0.0, total) };
        if self.region.is_active(total) {
            target = self.bounds().clamp(target);
        }
        self.clock.set_position(target);

        if self.state == EngineState::Playing {
            self.stop_all();
            self.start_all(target)?;
        }
        Ok(())
    }

    pub fn skip(&mut self, delta: f64) -> Result<()> {
        let total = self.clock.total_duration();
        let mut target = self.current_position() + delta;
        if !self.region.is_active(total) && total > 0.0 {
            target = target.rem_euclid(total);
        }
        self.seek(target)
    }

    fn channel_mut(&mut self, stem: &str) -> Result<&mut StemChannel<O::Voice>> {
        self.channels
            .iter_mut()
            .find(|c| c.name() == stem)
            .ok_or_else(|| EngineError::UnknownStem(stem.to_string()))
    }

    pub fn set_volume(&mut self, stem: &str, volume: f32) -> Result<()> {
        self.channel_mut(stem)?.set_volume(volume);
        Ok(())
    }

    pub fn set_muted(&mut self, stem: &str, muted: bool) -> Result<()> {
        self.channel_mut(stem)?.set_muted(muted);
        Ok(())
    }

    pub fn toggle_muted(&mut self, stem: &str) -> Result<bool> {
        let channel = self.channel_mut(stem)?;
        let muted = !channel.is_muted();
        channel.set_muted(muted);
        Ok(muted)
    }

    /// Switching on only arms the region; it takes effect on the next seek or
    /// play. Switching off while playing restarts from the same position with
    /// whole-track looping.
    pub fn set_loop_enabled(&mut self, enabled: bool) -> Result<()> {
        let total = self.clock.total_duration();

        if enabled {
            self.region.validate(total)?;
            self.region.enabled = true;
            return Ok(());
        }

        if !self.region.enabled {
            self.region.reset(total);
            return Ok(());
        }

        let was_playing = self.is_playing();
        if was_playing {
            self.pause();
        }
        self.region.enabled = false;
        self.region.reset(total);
        if was_playing {
            self.play()?;
        }
        Ok(())
    }

    pub fn toggle_loop(&mut self) -> Result<()> {
        self.set_loop_enabled(!self.region.enabled)
    }

    /// Set A to the current position. The value is kept even when it inverts
    /// the region; the error only reports that.
    pub fn mark_loop_start(&mut self) -> Result<()> {
        self.region.start = self.current_position();
        self.check_region()
    }

    /// Set B to the current position. See [`mark_loop_start`](Self::mark_loop_start).
    pub fn mark_loop_end(&mut self) -> Result<()> {
        self.region.end = self.current_position();
        self.check_region()
    }

    fn check_region(&self) -> Result<()> {
        let checked = self.region.validate(self.clock.total_duration());
        if let Err(e) = &checked {
            log::warn!("{e}");
        }
        checked
    }

    pub fn drag_loop_start(&mut self, t: f64) {
        self.region.drag_start(t);
    }

    pub fn drag_loop_end(&mut self, t: f64) {
        let total = self.clock.total_duration();
        self.region.drag_end(t, total);
    }

    /// Live voices cannot move their loop points, so a playing engine
    /// restarts in place to pick up the edited region.
    pub fn release_loop_drag(&mut self) -> Result<()> {
        if self.is_playing() {
            let position = self.current_position();
            self.seek(position)?;
        }
        Ok(())
    }

    fn start_all(&mut self, position: f64) -> Result<()> {
        let bounds = self.bounds();
        let position = bounds.clamp(self.snap_to_frame(position));
        let start_at = self.output.now() + self.options.schedule_lead;

        let mut started = 0;
        for channel in self.channels.iter_mut().filter(|c| c.is_playable()) {
            match channel.start_voice(&self.output, position, bounds, start_at) {
                Ok(()) => started += 1,
                Err(e) => log::warn!("stem '{}' skipped this cycle: {e}", channel.name()),
            }
        }

        if started == 0 {
            let err = EngineError::PlaybackStart("no stem could start".to_string());
            self.clock.set_position(position);
            self.state = EngineState::Ready;
            self.last_error = Some(err.clone());
            return Err(err);
        }

        self.clock.mark_started(position, start_at, bounds);
        self.state = EngineState::Playing;
        self.last_error = None;
        log::debug!(
            "started {started} voices at {position:.3}s within [{:.3}, {:.3})",
            bounds.start,
            bounds.end
        );
        Ok(())
    }

    fn stop_all(&mut self) {
        for channel in &mut self.channels {
            channel.stop_voice();
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let total = self.clock.total_duration();
        EngineSnapshot {
            state: self.state,
            title: self.session.as_ref().map(|s| s.display_title().to_string()),
            is_playing: self.is_playing(),
            position: self.current_position(),
            total_duration: total,
            loop_region: LoopSnapshot {
                enabled: self.region.enabled,
                start: self.region.start,
                end: self.region.end,
                valid: self.region.is_valid(total),
            },
            stems: self
                .channels
                .iter()
                .map(|c| StemSnapshot {
                    name: c.name().to_string(),
                    volume: c.gain(),
                    muted: c.is_muted(),
                    load_error: c.load_error().is_some(),
                    error: c.load_error().map(str::to_string),
                    sounding: c.is_sounding(),
                })
                .collect(),
            error: self.last_error.clone(),
        }
    }
}

impl<O: AudioOutput> Drop for PlaybackEngine<O> {
    fn drop(&mut self) {
        self.stop_all();
    }
}
