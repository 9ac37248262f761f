use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};

use super::error::AudioError;
use super::types::{AudioOutput, VoiceRequest};
use super::voice::{LoopingSource, RodioVoice};

/// Silence placed ahead of each voice in a batch.
///
/// The mixer picks up sinks added in one batch on the same callback, so every
/// voice sharing a `start_at` must carry the same delay. The first voice of a
/// batch measures it and the rest reuse it.
#[derive(Debug, Default)]
pub(crate) struct BatchLead {
    current: Cell<Option<(u64, Duration)>>,
}

impl BatchLead {
    pub(crate) fn lead_for(&self, start_at: f64, now: f64) -> Duration {
        let key = start_at.to_bits();
        match self.current.get() {
            Some((batch, lead)) if batch == key => lead,
            _ => {
                let lead = Duration::from_secs_f64((start_at - now).max(0.0));
                self.current.set(Some((key, lead)));
                lead
            }
        }
    }
}

/// The default output device, opened once per process.
///
/// Voices are rodio sinks on the stream's mixer. A voice scheduled for
/// `start_at` is prefixed with silence, and every voice of one batch gets the
/// same amount of it.
pub struct RodioOutput {
    stream: OutputStream,
    epoch: Instant,
    lead: BatchLead,
}

impl RodioOutput {
    pub fn open_default() -> Result<Self, AudioError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| AudioError::Output(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which tears through the TUI.
        stream.log_on_drop(false);

        log::info!("audio output opened");
        Ok(Self {
            stream,
            epoch: Instant::now(),
            lead: BatchLead::default(),
        })
    }
}

impl AudioOutput for RodioOutput {
    type Voice = RodioVoice;

    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn start_voice(&self, request: VoiceRequest) -> Result<RodioVoice, AudioError> {
        let rendered = Arc::new(AtomicU64::new(0));
        let source = LoopingSource::new(&request, rendered.clone())?;

        let lead = self.lead.lead_for(request.start_at, self.now());
        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(request.gain);
        sink.append(source.delay(lead));

        Ok(RodioVoice::new(sink, rendered, &request))
    }
}
