pub mod wav_sink;

pub use wav_sink::{WavFileSink, save_wav};
