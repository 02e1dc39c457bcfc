//! Speech playback: PCM decoding and the single-clip controller.

mod controller;
mod pcm;

pub use controller::{AudioSink, PlaybackController, PlaybackHandle};
pub use pcm::{
    PcmBuffer, SPEECH_CHANNELS, SPEECH_SAMPLE_RATE, decode_base64, decode_pcm16,
    decode_speech_payload,
};
