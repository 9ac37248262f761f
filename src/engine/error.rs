use thiserror::Error;

use super::types::EngineState;

/// Errors surfaced by the playback engine.
///
/// Only `AllStemsFailed` and `PlaybackStart` block the transition into
/// `Playing`; everything else degrades gracefully.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("stem '{stem}' failed to load: {reason}")]
    StemLoad { stem: String, reason: String },

    #[error("no stem could be loaded for this track")]
    AllStemsFailed,

    #[error("loop markers are inverted (A = {start:.2}s, B = {end:.2}s)")]
    InvalidLoopRegion { start: f64, end: f64 },

    #[error("audio output refused to start: {0}")]
    PlaybackStart(String),

    #[error("no stem named '{0}' in this session")]
    UnknownStem(String),

    #[error("engine is {0:?}, not ready for playback")]
    NotReady(EngineState),
}

pub type Result<T> = std::result::Result<T, EngineError>;
