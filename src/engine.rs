//! The multi-stem playback engine.
//!
//! A `PlaybackEngine` owns one `TrackSession` at a time: its stem channels, a
//! transport clock and an A-B loop region. All mutation happens on the
//! caller's thread; the audio output only ever sees fully built voices.

mod channel;
mod clock;
mod error;
mod player;
mod region;
mod types;

pub use channel::StemChannel;
pub use clock::TransportClock;
pub use error::{EngineError, Result};
pub use player::{EngineOptions, PlaybackEngine};
pub use region::{LOOP_EPSILON, LoopBounds, LoopRegion};
pub use types::{EngineSnapshot, EngineState, LoopSnapshot, StemSnapshot, TrackSession};

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;
