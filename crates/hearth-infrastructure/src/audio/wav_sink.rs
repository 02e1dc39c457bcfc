//! Audio sink that renders clips to WAV files.
//!
//! Headless hosts have no sound device; each clip is written as a 16-bit WAV
//! file that a player can pick up. A clip counts as playing until it is
//! stopped or its duration has elapsed. Only the latest clip is kept on disk.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hearth_core::audio::{AudioSink, PcmBuffer, PlaybackHandle};
use hearth_core::error::{HearthError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info};

const BITS_PER_SAMPLE: u16 = 16;

pub struct WavFileSink {
    output_dir: PathBuf,
    counter: AtomicU64,
    last_clip: Mutex<Option<PathBuf>>,
}

impl WavFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            counter: AtomicU64::new(0),
            last_clip: Mutex::new(None),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the most recently started clip.
    pub fn last_clip(&self) -> Option<PathBuf> {
        self.last_clip
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn next_path(&self) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S%3f");
        self.output_dir.join(format!("speech-{}-{}.wav", stamp, n))
    }
}

impl AudioSink for WavFileSink {
    fn start(&self, buffer: PcmBuffer) -> Result<Box<dyn PlaybackHandle>> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| HearthError::playback(format!("cannot create audio directory: {}", e)))?;

        let path = self.next_path();
        save_wav(&path, &buffer)?;

        let duration = buffer.duration();
        info!(path = %path.display(), duration_ms = duration.as_millis() as u64, "Rendered speech clip");
        let previous = self
            .last_clip
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(path.clone());
        if let Some(previous) = previous {
            if let Err(e) = std::fs::remove_file(&previous) {
                debug!(path = %previous.display(), error = %e, "Could not remove previous clip");
            }
        }

        Ok(Box::new(WavClip {
            path,
            started: Instant::now(),
            duration,
            stopped: false,
        }))
    }
}

/// Writes `buffer` as a 16-bit integer WAV file.
pub fn save_wav(path: &Path, buffer: &PcmBuffer) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channel_count(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let wav_error = |e: hound::Error| HearthError::playback(format!("failed to write WAV: {}", e));
    let mut writer = WavWriter::create(path, spec).map_err(wav_error)?;
    for sample in buffer.interleaved_i16() {
        writer.write_sample(sample).map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;
    Ok(())
}

struct WavClip {
    path: PathBuf,
    started: Instant,
    duration: Duration,
    stopped: bool,
}

impl PlaybackHandle for WavClip {
    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            debug!(path = %self.path.display(), "Clip stopped");
        }
    }

    fn is_active(&self) -> bool {
        !self.stopped && self.started.elapsed() < self.duration
    }
}
