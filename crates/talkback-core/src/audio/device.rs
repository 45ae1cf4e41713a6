//! Input and output device abstractions.
//!
//! Sessions pull frames from an [`InputSource`] and push them to an
//! [`OutputSink`] so that tests can substitute scripted devices. The real
//! implementations wrap CPAL's default host devices.

use crate::{AudioError, CoreResult, audio::Resampler};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// Maximum samples to buffer (5 minutes at 48kHz mono).
/// Prevents unbounded memory growth during long recordings.
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 5;

/// How long a pull waits for the device before handing back an empty chunk
/// so the worker can re-check its recording state.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// A pull-style microphone.
///
/// The capture worker calls [`read_chunk`](InputSource::read_chunk) in a
/// loop while recording; an implementation blocks briefly until a chunk of
/// frames is available and may return an empty chunk on timeout.
pub trait InputSource: Send {
    /// Open the device and begin buffering frames.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be started.
    fn start(&mut self) -> CoreResult<()>;

    /// Pull the next chunk of mono f32 frames.
    ///
    /// # Errors
    ///
    /// Returns an error if the device failed mid-stream.
    fn read_chunk(&mut self) -> CoreResult<Vec<f32>>;

    /// Stop buffering and release the device.
    fn stop(&mut self);

    /// Native sample rate of the frames this source produces.
    fn sample_rate(&self) -> u32;
}

/// A blocking speaker.
pub trait OutputSink: Send {
    /// Stream `samples` at `sample_rate` until exhausted or until `abort`
    /// is observed set.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be driven.
    fn stream(&mut self, samples: &[f32], sample_rate: u32, abort: &AtomicBool) -> CoreResult<()>;
}

struct InputShared {
    samples: Mutex<VecDeque<f32>>,
    available: Condvar,
}

/// Microphone input over CPAL's default input device.
///
/// CPAL pushes frames from its callback thread into a bounded ring; the
/// session worker pulls fixed-size chunks back out. Multi-channel devices
/// are downmixed to mono in the callback.
pub struct CpalInput {
    device: Device,
    config: StreamConfig,
    chunk_frames: usize,
    shared: Arc<InputShared>,
    /// Signals the audio callback to stop writing before the stream is
    /// dropped, so no in-flight callback writes after `stop()` drains.
    shutdown: Arc<AtomicBool>,
    stream: Option<Stream>,
}

impl CpalInput {
    /// Open the default input device.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::NoMicrophoneFound`] if the host has no input
    /// device, or [`AudioError::DeviceError`] if its config is unreadable.
    #[track_caller]
    #[instrument]
    pub fn new(chunk_frames: usize) -> CoreResult<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(AudioError::NoMicrophoneFound {
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to get input config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            chunk_frames = chunk_frames,
            "CpalInput initialized"
        );

        Ok(Self {
            device,
            config: config.into(),
            chunk_frames,
            shared: Arc::new(InputShared {
                samples: Mutex::new(VecDeque::with_capacity(MAX_BUFFER_SAMPLES)),
                available: Condvar::new(),
            }),
            shutdown: Arc::new(AtomicBool::new(false)),
            stream: None,
        })
    }
}

impl InputSource for CpalInput {
    #[instrument(skip(self))]
    fn start(&mut self) -> CoreResult<()> {
        let shared = Arc::clone(&self.shared);
        let shutdown = Arc::clone(&self.shutdown);
        let channels = usize::from(self.config.channels);

        self.shutdown.store(false, Ordering::Release);

        self.shared
            .samples
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    // Recover from lock poison rather than silently dropping
                    // audio; the ring data is still valid after a panic
                    // elsewhere.
                    let mut buf = shared.samples.lock().unwrap_or_else(|e| {
                        error!("Input ring lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    if channels > 1 {
                        buf.extend(data.chunks_exact(channels).map(|frame| {
                            frame.iter().sum::<f32>() / frame.len() as f32
                        }));
                    } else {
                        buf.extend(data.iter().copied());
                    }
                    while buf.len() > MAX_BUFFER_SAMPLES {
                        buf.pop_front();
                    }
                    drop(buf);
                    shared.available.notify_all();
                },
                |err| {
                    error!("Input stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to build input stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| AudioError::DeviceError {
            reason: format!("Failed to start input stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.stream = Some(stream);
        info!("Audio capture started");

        Ok(())
    }

    fn read_chunk(&mut self) -> CoreResult<Vec<f32>> {
        let deadline = Instant::now() + READ_TIMEOUT;
        let mut buf = self
            .shared
            .samples
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        loop {
            if buf.len() >= self.chunk_frames {
                return Ok(buf.drain(..self.chunk_frames).collect());
            }

            let now = Instant::now();
            if now >= deadline {
                // Hand back whatever arrived so the caller can re-check its
                // recording state without dropping frames.
                return Ok(buf.drain(..).collect());
            }

            let (guard, _timeout) = self
                .shared
                .available
                .wait_timeout(buf, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            buf = guard;
        }
    }

    #[instrument(skip(self))]
    fn stop(&mut self) {
        // Flag first: even if a backend's Stream::drop returns before the
        // final callback, the callback observes the flag and writes nothing.
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            std::thread::sleep(Duration::from_millis(5));
            info!("Audio capture stopped");
        }
    }

    fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }
}

/// Speaker output over CPAL's default output device.
///
/// Samples are resampled to the device rate when they differ, then fed from
/// the output callback; the calling thread polls for completion and honors
/// the abort flag by dropping the stream early.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
}

impl CpalOutput {
    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::NoSpeakerFound`] if the host has no output
    /// device, or [`AudioError::DeviceError`] if its config is unreadable.
    #[track_caller]
    #[instrument]
    pub fn new() -> CoreResult<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or(AudioError::NoSpeakerFound {
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to get output config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate(),
            channels = config.channels(),
            "CpalOutput initialized"
        );

        Ok(Self {
            device,
            config: config.into(),
        })
    }
}

impl OutputSink for CpalOutput {
    #[instrument(skip(self, samples, abort))]
    fn stream(&mut self, samples: &[f32], sample_rate: u32, abort: &AtomicBool) -> CoreResult<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let device_rate = self.config.sample_rate;
        let samples: Arc<Vec<f32>> = if sample_rate == device_rate {
            Arc::new(samples.to_vec())
        } else {
            let mut resampler = Resampler::new(sample_rate, device_rate)?;
            Arc::new(resampler.resample(samples)?)
        };

        let channels = usize::from(self.config.channels);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let cb_samples = Arc::clone(&samples);
        let cb_position = Arc::clone(&position);
        let cb_finished = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = cb_position.load(Ordering::Acquire);
                    for frame in data.chunks_mut(channels) {
                        let sample = if pos < cb_samples.len() {
                            let s = cb_samples[pos];
                            pos += 1;
                            s
                        } else {
                            cb_finished.store(true, Ordering::Release);
                            0.0
                        };
                        frame.fill(sample);
                    }
                    cb_position.store(pos, Ordering::Release);
                },
                |err| {
                    error!("Output stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::DeviceError {
                reason: format!("Failed to build output stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| AudioError::DeviceError {
            reason: format!("Failed to start output stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Poll for completion; the clip duration plus margin bounds the wait
        // in case the device swallows the tail without flagging it.
        let duration_ms = (samples.len() as u64 * 1000) / u64::from(device_rate);
        let deadline = Instant::now() + Duration::from_millis(duration_ms + 500);

        let mut aborted = false;
        while !finished.load(Ordering::Acquire) {
            if abort.load(Ordering::Acquire) {
                aborted = true;
                break;
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        if !aborted {
            // Let the device drain its last buffer.
            std::thread::sleep(Duration::from_millis(100));
        }

        drop(stream);
        debug!(
            sample_count = samples.len(),
            aborted = aborted,
            "playback stream finished"
        );

        Ok(())
    }
}
