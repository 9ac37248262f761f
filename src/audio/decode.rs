use std::io::Cursor;

use rodio::{Decoder, Source};

use super::error::AudioError;
use super::types::PcmBuffer;

/// Decode a whole stem file held in memory into interleaved `f32` PCM.
pub fn decode_stem(bytes: Vec<u8>) -> Result<PcmBuffer, AudioError> {
    let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))?;

    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.collect();

    if samples.is_empty() {
        return Err(AudioError::Decode("stream contained no audio".to_string()));
    }

    Ok(PcmBuffer::new(samples, channels, sample_rate))
}
