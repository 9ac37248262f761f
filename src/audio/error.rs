use thiserror::Error;

/// Failures while fetching, decoding or scheduling audio.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("sample rate {found} Hz does not match the session's {expected} Hz")]
    SampleRateMismatch { found: u32, expected: u32 },

    #[error("voice rejected: {0}")]
    Voice(String),
}
