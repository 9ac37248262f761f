//! Helpers for driving an engine without an audio device.

use crate::audio::fake::FakeOutput;
use crate::audio::{AudioError, LoadOutcome, PcmBuffer};

use super::{PlaybackEngine, TrackSession};

pub const RATE: u32 = 100;

/// Open a session on `engine` whose stems decode to silent mono buffers of
/// the given lengths in seconds. `None` makes that stem fail to decode.
pub fn loaded_engine(engine: &mut PlaybackEngine<FakeOutput>, stems: &[(&str, Option<f64>)]) {
    let names = stems.iter().map(|(n, _)| n.to_string()).collect();
    let request = engine.open_session(TrackSession::new("abc123", "Test Track", names), |n| format!("mem://{n}"));
    let results = stems
        .iter()
        .map(|(name, secs)| {
            let result = match secs {
                Some(s) => Ok(PcmBuffer::new(vec![0.0; (s * RATE as f64).round() as usize], 1, RATE)),
                None => Err(AudioError::Decode("bad header".to_string())),
            };
            (name.to_string(), result)
        })
        .collect();
    assert!(engine.apply_load(LoadOutcome {
        generation: request.generation,
        results,
    }));
}
