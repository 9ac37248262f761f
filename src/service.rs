//! Client for the stem-separation backend.
//!
//! The backend owns the job lifecycle: a track is submitted once, polled until
//! its stems are ready, and each stem is then served as a WAV file.

mod client;
mod error;
mod status;
mod wait;

pub use client::{ProcessRequest, ProcessedTrack, SeparationClient};
pub use error::{Result, ServiceError};
pub use status::JobStatus;
pub use wait::{JobStatusSource, wait_for_job};
