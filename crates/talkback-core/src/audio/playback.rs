//! Hotkey-interruptible playback session.
//!
//! One [`PlaybackSession`] streams a decoded buffer to the output sink while
//! a concurrent stop-key listener can abort it mid-stream (barge-in). The
//! call to [`play`](PlaybackSession::play) returns only after both the
//! streamer and the listener have observed completion and the stop hotkey
//! has been deregistered.

use crate::{
    AudioError, CoreResult,
    audio::{AudioFormat, AudioSpec, OutputSink, format},
    hotkey::{HotkeyBus, HotkeyGuard, Key},
};

use std::{
    fs,
    panic::Location,
    path::PathBuf,
    sync::{
        Arc, Condvar, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a playback cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No playback yet.
    Idle,
    /// Streamer is feeding the output device.
    Playing,
    /// Stop key fired; the streamer is being aborted.
    StopRequested,
    /// The last cycle finished (naturally or via stop).
    Finished,
}

/// What to play: a file on disk or an in-memory byte buffer.
#[derive(Debug)]
pub enum PlaybackSource {
    /// Read the container from a file.
    File(PathBuf),
    /// Decode the container from memory (the synthesis response path).
    Bytes(Vec<u8>),
}

struct PlaybackInner {
    state: PlaybackState,
    /// Set by the streamer when the sink call returns, naturally or after
    /// an abort. The listener exits on this.
    stream_done: bool,
}

struct PlaybackShared {
    inner: Mutex<PlaybackInner>,
    cond: Condvar,
}

impl PlaybackShared {
    fn lock(&self) -> MutexGuard<'_, PlaybackInner> {
        self.inner.lock().unwrap_or_else(|e| {
            warn!("Playback state lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Stop hotkey transition; a press after natural completion is a no-op.
    fn request_stop(&self) {
        let mut inner = self.lock();
        if inner.state == PlaybackState::Playing && !inner.stream_done {
            inner.state = PlaybackState::StopRequested;
            drop(inner);
            self.cond.notify_all();
        }
    }

    fn mark_stream_done(&self) {
        self.lock().stream_done = true;
        self.cond.notify_all();
    }
}

/// One speaker playback lifecycle under stop-key control.
///
/// Reusable, but not concurrently: overlapping [`play`](PlaybackSession::play)
/// calls fail fast with [`AudioError::SessionBusy`].
pub struct PlaybackSession<O: OutputSink> {
    bus: Arc<dyn HotkeyBus>,
    output: Mutex<O>,
    stop_key: Key,
    /// Encoding assumed for headerless PCM sources.
    pcm_spec: AudioSpec,
    shared: Arc<PlaybackShared>,
}

impl<O: OutputSink> PlaybackSession<O> {
    /// Create a session over `output` with `stop_key` as the barge-in key.
    pub fn new(bus: Arc<dyn HotkeyBus>, output: O, stop_key: Key, pcm_spec: AudioSpec) -> Self {
        Self {
            bus,
            output: Mutex::new(output),
            stop_key,
            pcm_spec,
            shared: Arc::new(PlaybackShared {
                inner: Mutex::new(PlaybackInner {
                    state: PlaybackState::Idle,
                    stream_done: false,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PlaybackState {
        self.shared.lock().state
    }

    /// Play a container-encoded clip, honoring the stop key.
    ///
    /// The stop hotkey is registered before the first sample is streamed and
    /// deregistered before this method returns. Both the streaming unit and
    /// the stop-listener unit are joined before return; a stop press after
    /// natural completion is a no-op.
    ///
    /// # Errors
    ///
    /// [`AudioError::NoAudioSource`] for an empty or unreadable source,
    /// [`AudioError::SessionBusy`] for an overlapping call, or a
    /// decode/device error from the cycle.
    #[track_caller]
    #[instrument(skip(self, source))]
    pub fn play(&self, source: PlaybackSource, container: AudioFormat) -> CoreResult<()> {
        {
            let mut inner = self.shared.lock();
            match inner.state {
                PlaybackState::Idle | PlaybackState::Finished => {
                    inner.state = PlaybackState::Playing;
                    inner.stream_done = false;
                }
                PlaybackState::Playing | PlaybackState::StopRequested => {
                    return Err(AudioError::SessionBusy {
                        reason: "play called while a playback is in flight".to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }

        let result = self.run_cycle(source, container);

        let mut inner = self.shared.lock();
        inner.state = PlaybackState::Finished;
        inner.stream_done = true;
        drop(inner);
        self.shared.cond.notify_all();

        result
    }

    fn run_cycle(&self, source: PlaybackSource, container: AudioFormat) -> CoreResult<()> {
        let bytes = match source {
            PlaybackSource::Bytes(bytes) => bytes,
            PlaybackSource::File(path) => {
                fs::read(&path).map_err(|e| AudioError::NoAudioSource {
                    reason: format!("failed to read {:?}: {}", path, e),
                    location: ErrorLocation::from(Location::caller()),
                })?
            }
        };

        if bytes.is_empty() {
            return Err(AudioError::NoAudioSource {
                reason: "source is empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let (samples, sample_rate) = format::decode(&bytes, container, self.pcm_spec)?;
        if samples.is_empty() {
            return Err(AudioError::NoAudioSource {
                reason: "source decoded to zero samples".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let abort = AtomicBool::new(false);

        // Registered before the streamer spawns, so even the shortest clip
        // is interruptible for its whole duration.
        let stop_shared = Arc::clone(&self.shared);
        let stop_guard = HotkeyGuard::register(
            Arc::clone(&self.bus),
            self.stop_key,
            Arc::new(move || stop_shared.request_stop()),
        )?;

        info!(
            sample_count = samples.len(),
            sample_rate = sample_rate,
            stop = %self.stop_key,
            "Playing audio, press stop key to interrupt"
        );

        let stream_result = thread::scope(|scope| {
            let streamer = scope.spawn(|| {
                let mut output = self.output.lock().unwrap_or_else(|e| {
                    warn!("Output device lock poisoned, recovering");
                    e.into_inner()
                });
                let result = output.stream(&samples, sample_rate, &abort);
                self.shared.mark_stream_done();
                result
            });

            let listener = scope.spawn(|| self.stop_listener(&abort));

            let result = streamer.join();
            // The listener always exits once stream_done is set.
            let _ = listener.join();
            result
        });

        // Deregistration completes before play returns, so the next cycle's
        // registration of the same key cannot collide with this one.
        stop_guard.release();

        match stream_result {
            Ok(result) => result,
            Err(_) => Err(AudioError::DeviceError {
                reason: "playback streamer panicked".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Stop-listener unit: waits for the stop key or natural completion.
    ///
    /// On a stop request it raises the abort flag for the sink, then waits
    /// until the streamer confirms it has stopped.
    fn stop_listener(&self, abort: &AtomicBool) {
        let mut inner = self.shared.lock();
        loop {
            if inner.stream_done {
                return;
            }
            if inner.state == PlaybackState::StopRequested {
                break;
            }
            inner = self
                .shared
                .cond
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
        drop(inner);

        debug!("Stop requested, aborting output stream");
        abort.store(true, Ordering::Release);

        let mut inner = self.shared.lock();
        while !inner.stream_done {
            inner = self
                .shared
                .cond
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }
    }
}
