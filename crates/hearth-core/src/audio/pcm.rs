//! Decoding of base64 signed 16-bit little-endian PCM into float samples.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{HearthError, Result};

/// Sample rate of speech returned by the synthesis service.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;
/// Speech is mono.
pub const SPEECH_CHANNELS: u16 = 1;

/// A decoded, de-interleaved audio clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl PcmBuffer {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        // Bounded by the `u16` channel count the buffer was decoded with.
        self.channels.len() as u16
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / f64::from(self.sample_rate))
    }

    /// Frames re-interleaved as 16-bit integers, for sinks that write PCM back out.
    pub fn interleaved_i16(&self) -> impl Iterator<Item = i16> + '_ {
        (0..self.frame_count()).flat_map(move |frame| {
            self.channels.iter().map(move |channel| {
                let scaled = (channel[frame] * 32768.0).round();
                scaled.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
            })
        })
    }
}

/// Decodes a standard base64 payload.
///
/// # Errors
///
/// `HearthError::Playback` if the payload is blank or not valid base64.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(HearthError::playback("audio payload is empty"));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| HearthError::playback(format!("audio payload is not valid base64: {}", e)))
}

/// Reinterprets raw bytes as interleaved signed 16-bit little-endian samples.
///
/// Each sample is divided by 32768, so values land in `[-1.0, 1.0)`. The
/// asymmetry is the usual PCM-to-float mapping and nothing is clamped.
///
/// # Errors
///
/// `HearthError::Playback` if the sample rate or channel count is zero, the
/// byte sequence is empty or of odd length, or the samples do not divide into
/// whole frames.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<PcmBuffer> {
    if sample_rate == 0 {
        return Err(HearthError::playback("sample rate must be positive"));
    }
    if channels == 0 {
        return Err(HearthError::playback("channel count must be positive"));
    }
    if bytes.is_empty() {
        return Err(HearthError::playback("audio payload contains no samples"));
    }
    if bytes.len() % 2 != 0 {
        return Err(HearthError::playback(format!(
            "audio payload has an odd byte count ({})",
            bytes.len()
        )));
    }

    let channel_count = usize::from(channels);
    let sample_count = bytes.len() / 2;
    if sample_count % channel_count != 0 {
        return Err(HearthError::playback(format!(
            "{} samples do not divide into {} channels",
            sample_count, channels
        )));
    }

    let frames = sample_count / channel_count;
    let mut decoded = vec![Vec::with_capacity(frames); channel_count];
    for (i, chunk) in bytes.chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        decoded[i % channel_count].push(f32::from(sample) / 32768.0);
    }

    Ok(PcmBuffer {
        sample_rate,
        channels: decoded,
    })
}

/// Base64 payload straight to a playable buffer.
pub fn decode_speech_payload(payload: &str, sample_rate: u32, channels: u16) -> Result<PcmBuffer> {
    let bytes = decode_base64(payload)?;
    decode_pcm16(&bytes, sample_rate, channels)
}
