//! Hotkey-driven microphone capture session.
//!
//! One [`CaptureSession`] owns one recording lifecycle at a time: the caller
//! blocks in [`await_capture`](CaptureSession::await_capture) while a worker
//! thread pulls frames from the input device, and the stop/cancel hotkeys
//! end the cycle asynchronously from the bus dispatcher thread. The session
//! state lives behind a mutex shared by all three threads; a condvar signals
//! transitions and worker completion.

use crate::{
    AudioError, CoreResult,
    audio::{AudioBuffer, AudioFormat, AudioSpec, InputSource, Resampler, format},
    hotkey::{HotkeyBus, HotkeyGuard, Key},
};

use std::{
    panic::Location,
    sync::{Arc, Condvar, Mutex, MutexGuard},
    thread,
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Keys driving one capture cycle.
#[derive(Debug, Clone, Copy)]
pub struct CaptureKeys {
    /// Arms the session and starts recording.
    pub start: Key,
    /// Ends recording and keeps the audio.
    pub stop: Key,
    /// Ends recording and discards the audio.
    pub cancel: Key,
}

/// Lifecycle of a capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// No cycle in flight.
    Idle,
    /// Start key consumed; hotkeys being wired, worker not yet recording.
    Armed,
    /// Worker is pulling frames from the input device.
    Recording,
    /// Cancel key fired; the frames are being discarded.
    Cancelled,
    /// Stop key fired; the frames are being finalized.
    Completed,
}

/// Result of one capture cycle.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The user stopped the recording; here is the container-encoded audio.
    Captured(AudioBuffer),
    /// The user cancelled; no audio is available and none was kept.
    Cancelled,
}

struct CaptureInner {
    state: RecordingState,
    /// Buffer from the most recent successful (non-cancelled) cycle.
    buffer: Option<AudioBuffer>,
    /// True from worker spawn until the cycle's buffer is published or
    /// discarded; [`CaptureSession::audio`] blocks on this.
    worker_active: bool,
}

struct CaptureShared {
    inner: Mutex<CaptureInner>,
    cond: Condvar,
}

impl CaptureShared {
    fn lock(&self) -> MutexGuard<'_, CaptureInner> {
        self.inner.lock().unwrap_or_else(|e| {
            warn!("Capture state lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn state(&self) -> RecordingState {
        self.lock().state
    }

    fn set_state(&self, state: RecordingState) {
        self.lock().state = state;
        self.cond.notify_all();
    }

    /// Hotkey transition. Valid only while armed or recording; repeat
    /// presses and presses after the first transition are no-ops.
    fn request_finish(&self, cancelled: bool) {
        let mut inner = self.lock();
        match inner.state {
            RecordingState::Armed | RecordingState::Recording => {
                inner.state = if cancelled {
                    RecordingState::Cancelled
                } else {
                    RecordingState::Completed
                };
                drop(inner);
                self.cond.notify_all();
            }
            _ => {}
        }
    }
}

/// One microphone recording lifecycle under hotkey control.
///
/// Reusable: each [`await_capture`](CaptureSession::await_capture) call runs
/// a fresh cycle on the same device and bus. The session registers its stop
/// and cancel hotkeys per cycle and deregisters them before returning, on
/// every exit path, so a later cycle's identical key press can never fire a
/// stale callback.
pub struct CaptureSession<I: InputSource> {
    bus: Arc<dyn HotkeyBus>,
    input: Mutex<I>,
    keys: CaptureKeys,
    spec: AudioSpec,
    container: AudioFormat,
    shared: Arc<CaptureShared>,
}

impl<I: InputSource> CaptureSession<I> {
    /// Create a session over `input`, encoding completed captures at `spec`
    /// into `container`.
    pub fn new(
        bus: Arc<dyn HotkeyBus>,
        input: I,
        keys: CaptureKeys,
        spec: AudioSpec,
        container: AudioFormat,
    ) -> Self {
        Self {
            bus,
            input: Mutex::new(input),
            keys,
            spec,
            container,
            shared: Arc::new(CaptureShared {
                inner: Mutex::new(CaptureInner {
                    state: RecordingState::Idle,
                    buffer: None,
                    worker_active: false,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecordingState {
        self.shared.state()
    }

    /// Block until the user completes one capture cycle.
    ///
    /// Waits for the start key, records on a worker thread until the stop or
    /// cancel key fires, and returns the encoded buffer or the cancellation
    /// outcome. Stop and cancel hotkeys are deregistered before this method
    /// returns, whichever way the cycle ends.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::SessionBusy`] if a cycle is already in flight,
    /// or a device/encoding error from the cycle itself.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn await_capture(&self) -> CoreResult<CaptureOutcome> {
        {
            let mut inner = self.shared.lock();
            if inner.worker_active
                || matches!(
                    inner.state,
                    RecordingState::Armed | RecordingState::Recording
                )
            {
                return Err(AudioError::SessionBusy {
                    reason: "await_capture called while a cycle is in flight".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            inner.state = RecordingState::Idle;
        }

        info!(
            start = %self.keys.start,
            stop = %self.keys.stop,
            cancel = %self.keys.cancel,
            "User turn: press start key to record, stop to finish, cancel to discard"
        );

        self.bus.block_until(self.keys.start);
        self.shared.set_state(RecordingState::Armed);

        let stop_shared = Arc::clone(&self.shared);
        let stop_guard = HotkeyGuard::register(
            Arc::clone(&self.bus),
            self.keys.stop,
            Arc::new(move || stop_shared.request_finish(false)),
        )?;

        let cancel_shared = Arc::clone(&self.shared);
        let cancel_guard = HotkeyGuard::register(
            Arc::clone(&self.bus),
            self.keys.cancel,
            Arc::new(move || cancel_shared.request_finish(true)),
        )?;

        {
            // A very fast stop/cancel press may have already transitioned us
            // out of Armed; only then does the worker loop run zero times.
            let mut inner = self.shared.lock();
            if inner.state == RecordingState::Armed {
                inner.state = RecordingState::Recording;
            }
            inner.worker_active = true;
        }

        info!("Recording audio");

        let worker_result = thread::scope(|scope| {
            scope
                .spawn(|| self.record_worker())
                .join()
                .map_err(|_| AudioError::DeviceError {
                    reason: "capture worker panicked".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })
        });

        let outcome = self.finish_cycle(worker_result);

        // Deregister both hotkeys exactly once before returning, regardless
        // of which key fired or whether the cycle errored.
        stop_guard.release();
        cancel_guard.release();

        outcome
    }

    /// Worker loop: pull chunks while the state stays `Recording`.
    fn record_worker(&self) -> CoreResult<(Vec<f32>, u32)> {
        let mut input = self.input.lock().unwrap_or_else(|e| {
            warn!("Input device lock poisoned, recovering");
            e.into_inner()
        });

        input.start()?;
        let input_rate = input.sample_rate();

        let mut frames: Vec<f32> = Vec::new();
        let result = loop {
            if self.shared.state() != RecordingState::Recording {
                break Ok(());
            }
            match input.read_chunk() {
                Ok(chunk) => frames.extend_from_slice(&chunk),
                Err(e) => break Err(e),
            }
        };

        input.stop();
        result?;

        debug!(sample_count = frames.len(), "Capture worker drained input");

        Ok((frames, input_rate))
    }

    /// Publish or discard the cycle's frames and reset the state machine.
    fn finish_cycle(&self, worker_result: Result<CoreResult<(Vec<f32>, u32)>, AudioError>) -> CoreResult<CaptureOutcome> {
        let final_state = self.shared.state();

        let outcome = worker_result
            .unwrap_or_else(Err)
            .and_then(|(frames, input_rate)| match final_state {
                RecordingState::Cancelled => Ok(CaptureOutcome::Cancelled),
                _ => {
                    let samples = if input_rate == self.spec.sample_rate {
                        frames
                    } else {
                        Resampler::new(input_rate, self.spec.sample_rate)?.resample(&frames)?
                    };
                    let buffer = format::encode(&samples, self.spec, self.container)?;
                    Ok(CaptureOutcome::Captured(buffer))
                }
            });

        let mut inner = self.shared.lock();
        inner.worker_active = false;
        inner.state = RecordingState::Idle;
        match &outcome {
            Ok(CaptureOutcome::Captured(buffer)) => {
                inner.buffer = Some(buffer.clone());
            }
            Ok(CaptureOutcome::Cancelled) | Err(_) => {
                inner.buffer = None;
            }
        }
        drop(inner);
        self.shared.cond.notify_all();

        match &outcome {
            Ok(CaptureOutcome::Captured(buffer)) => {
                info!(byte_count = buffer.len(), "Finished recording audio");
            }
            Ok(CaptureOutcome::Cancelled) => {
                info!("Recording cancelled");
            }
            Err(_) => {}
        }

        outcome
    }

    /// Whether a successful (non-cancelled) capture is available.
    pub fn has_audio(&self) -> bool {
        self.shared.lock().buffer.is_some()
    }

    /// The most recent capture, re-encoded into `container` if it differs.
    ///
    /// Blocks while a recording is in flight and returns once the worker
    /// finishes; conversion is a pure function of the captured data and
    /// never re-records.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::NoAudioCaptured`] if no successful capture has
    /// completed, or an encoding error from the conversion.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn audio(&self, container: AudioFormat) -> CoreResult<AudioBuffer> {
        let mut inner = self.shared.lock();
        while inner.worker_active
            || matches!(
                inner.state,
                RecordingState::Armed | RecordingState::Recording
            )
        {
            inner = self
                .shared
                .cond
                .wait(inner)
                .unwrap_or_else(|e| e.into_inner());
        }

        let buffer = inner.buffer.clone().ok_or(AudioError::NoAudioCaptured {
            location: ErrorLocation::from(Location::caller()),
        })?;
        drop(inner);

        if buffer.format() == container {
            Ok(buffer)
        } else {
            format::transcode(&buffer, container)
        }
    }
}
