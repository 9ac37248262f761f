//! Audio plumbing: decoding stems into PCM, fanning out stem loads, and the
//! process-wide output graph that voices are scheduled on.
//!
//! The engine only talks to the [`AudioOutput`] and [`Voice`] traits; the
//! rodio-backed implementation lives in `output` and `voice`.

mod decode;
mod error;
mod loader;
mod output;
mod types;
mod voice;

pub use decode::decode_stem;
pub use error::AudioError;
pub use loader::{HttpFetcher, LoadOutcome, LoadRequest, StemFetcher, StemSource, load_stems, spawn_loader};
pub use output::RodioOutput;
pub use types::{AudioOutput, PcmBuffer, Voice, VoiceRequest};

#[cfg(test)]
pub(crate) mod fake;
