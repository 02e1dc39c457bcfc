//! Single-clip playback controller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{HearthError, Result};

use super::pcm::{PcmBuffer, decode_speech_payload};

/// A clip that has been started on an [`AudioSink`].
pub trait PlaybackHandle: Send {
    /// Stops the clip. Fire-and-forget; must be idempotent.
    fn stop(&mut self);

    /// Whether the clip is still playing.
    fn is_active(&self) -> bool;
}

/// Host audio output.
///
/// `start` may block (device setup, file rendering); the controller only
/// calls it from a blocking task.
pub trait AudioSink: Send + Sync {
    /// Starts playing `buffer` immediately.
    fn start(&self, buffer: PcmBuffer) -> Result<Box<dyn PlaybackHandle>>;
}

/// Plays decoded speech, at most one clip at a time.
///
/// The controller owns the only handle to the current clip. Starts are
/// serialized, and every start stops the previous clip before the new one
/// begins. A `stop` issued while a clip is still being prepared also cancels
/// that clip.
pub struct PlaybackController {
    sink: Arc<dyn AudioSink>,
    current: Mutex<Option<Box<dyn PlaybackHandle>>>,
    starting: tokio::sync::Mutex<()>,
    stop_epoch: AtomicU64,
}

impl PlaybackController {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self {
            sink,
            current: Mutex::new(None),
            starting: tokio::sync::Mutex::new(()),
            stop_epoch: AtomicU64::new(0),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Box<dyn PlaybackHandle>>> {
        // A panic inside a sink must not disable playback for the session.
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stops the current clip. Returns whether one was playing.
    pub fn stop(&self) -> bool {
        self.stop_epoch.fetch_add(1, Ordering::SeqCst);
        match self.slot().take() {
            Some(mut handle) => {
                let was_active = handle.is_active();
                handle.stop();
                debug!(was_active, "Stopped playback");
                was_active
            }
            None => false,
        }
    }

    /// Whether a clip is currently playing. Finished clips are released.
    pub fn is_playing(&self) -> bool {
        let mut slot = self.slot();
        match slot.as_ref() {
            Some(handle) if handle.is_active() => true,
            Some(_) => {
                *slot = None;
                false
            }
            None => false,
        }
    }

    /// Decodes a base64 PCM payload and plays it, both off the async executor.
    ///
    /// Any current clip is stopped before decoding starts, so a failed decode
    /// leaves nothing playing.
    ///
    /// # Returns
    ///
    /// The duration of the clip that started.
    ///
    /// # Errors
    ///
    /// `HearthError::Playback` if decoding or starting the sink fails. The
    /// controller holds no handle afterwards.
    pub async fn play_base64(&self, payload: String, sample_rate: u32, channels: u16) -> Result<Duration> {
        let _starting = self.starting.lock().await;
        self.stop();
        let epoch = self.stop_epoch.load(Ordering::SeqCst);

        let sink = self.sink.clone();
        let started = tokio::task::spawn_blocking(move || {
            let buffer = decode_speech_payload(&payload, sample_rate, channels)?;
            let duration = buffer.duration();
            sink.start(buffer).map(|handle| (handle, duration))
        })
        .await
        .map_err(|e| HearthError::playback(format!("audio task failed: {}", e)))?;

        let (mut handle, duration) = match started {
            Ok(started) => started,
            Err(err) if err.is_playback() => return Err(err),
            Err(err) => {
                warn!(error = %err, "Audio sink failed to start clip");
                return Err(HearthError::playback(err.to_string()));
            }
        };

        let mut slot = self.slot();
        if self.stop_epoch.load(Ordering::SeqCst) != epoch {
            handle.stop();
            debug!("Playback stopped before the clip started");
            return Ok(duration);
        }
        *slot = Some(handle);
        debug!(duration_ms = duration.as_millis() as u64, "Started playback");
        Ok(duration)
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    type EventLog = Arc<Mutex<Vec<String>>>;

    struct MockHandle {
        id: usize,
        active: Arc<AtomicBool>,
        events: EventLog,
    }

    impl PlaybackHandle for MockHandle {
        fn stop(&mut self) {
            if self.active.swap(false, Ordering::SeqCst) {
                self.events.lock().unwrap().push(format!("stop:{}", self.id));
            }
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct MockSink {
        next_id: AtomicUsize,
        events: EventLog,
        handles: Mutex<Vec<Arc<AtomicBool>>>,
        fail: AtomicBool,
        /// (entered, release) rendezvous around `start`
        gate: Option<(Arc<Barrier>, Arc<Barrier>)>,
    }

    impl MockSink {
        fn active_count(&self) -> usize {
            self.handles
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.load(Ordering::SeqCst))
                .count()
        }
    }

    impl AudioSink for MockSink {
        fn start(&self, _buffer: PcmBuffer) -> Result<Box<dyn PlaybackHandle>> {
            if let Some((entered, release)) = &self.gate {
                entered.wait();
                release.wait();
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(HearthError::playback("device unavailable"));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let active = Arc::new(AtomicBool::new(true));
            self.handles.lock().unwrap().push(active.clone());
            self.events.lock().unwrap().push(format!("start:{}", id));
            Ok(Box::new(MockHandle {
                id,
                active,
                events: self.events.clone(),
            }))
        }
    }

    fn payload() -> String {
        STANDARD.encode([0x00u8, 0x40, 0x00, 0xC0])
    }

    #[tokio::test]
    async fn test_new_clip_stops_previous_first() {
        let sink = Arc::new(MockSink::default());
        let controller = PlaybackController::new(sink.clone());

        controller.play_base64(payload(), 24_000, 1).await.unwrap();
        controller.play_base64(payload(), 24_000, 1).await.unwrap();

        assert_eq!(
            *sink.events.lock().unwrap(),
            vec!["start:1", "stop:1", "start:2"]
        );
        assert_eq!(sink.active_count(), 1);
        assert!(controller.is_playing());
    }

    #[tokio::test]
    async fn test_decode_failure_leaves_slot_empty() {
        let sink = Arc::new(MockSink::default());
        let controller = PlaybackController::new(sink.clone());
        controller.play_base64(payload(), 24_000, 1).await.unwrap();

        let err = controller
            .play_base64(String::new(), 24_000, 1)
            .await
            .unwrap_err();
        assert!(err.is_playback());
        assert!(!controller.is_playing());
        assert_eq!(sink.active_count(), 0);
    }

    #[tokio::test]
    async fn test_sink_failure_is_playback_error() {
        let sink = Arc::new(MockSink::default());
        sink.fail.store(true, Ordering::SeqCst);
        let controller = PlaybackController::new(sink.clone());

        let err = controller.play_base64(payload(), 24_000, 1).await.unwrap_err();
        assert!(err.is_playback());
        assert!(!controller.is_playing());
    }

    #[tokio::test]
    async fn test_stop() {
        let sink = Arc::new(MockSink::default());
        let controller = PlaybackController::new(sink.clone());
        assert!(!controller.stop());

        controller.play_base64(payload(), 24_000, 1).await.unwrap();
        assert!(controller.stop());
        assert!(!controller.is_playing());
        assert_eq!(sink.active_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_stop_while_preparing_cancels_the_clip() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let sink = Arc::new(MockSink {
            gate: Some((entered.clone(), release.clone())),
            ..MockSink::default()
        });
        let controller = Arc::new(PlaybackController::new(sink.clone()));

        let playing = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.play_base64(payload(), 24_000, 1).await })
        };

        tokio::task::spawn_blocking(move || entered.wait()).await.unwrap();
        controller.stop();
        tokio::task::spawn_blocking(move || release.wait()).await.unwrap();

        playing.await.unwrap().unwrap();
        assert!(!controller.is_playing());
        assert_eq!(sink.active_count(), 0);
        assert_eq!(*sink.events.lock().unwrap(), vec!["start:1", "stop:1"]);
    }
}
