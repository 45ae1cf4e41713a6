mod capture;
mod device;
mod format;
mod playback;
mod resampler;

pub use {
    capture::{CaptureKeys, CaptureOutcome, CaptureSession, RecordingState},
    device::{CpalInput, CpalOutput, InputSource, OutputSink},
    format::{AudioBuffer, AudioFormat, AudioSpec, decode, encode, transcode},
    playback::{PlaybackSession, PlaybackSource, PlaybackState},
    resampler::Resampler,
};
