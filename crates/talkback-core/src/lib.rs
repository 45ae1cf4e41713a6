//! Talkback Core Library
//!
//! Audio session machinery for a hotkey-driven voice assistant: capture and
//! playback state machines, container encode/decode, and the hotkey bus
//! abstraction that lets sessions react to keyboard events without owning a
//! keyboard backend.
//!
//! Layering, leaves first:
//!
//! - [`HotkeyBus`] — process-wide key/callback registry trait. Real backends
//!   live in the application crate; tests substitute a synchronous fake.
//! - [`InputSource`] / [`OutputSink`] — pull-style microphone and speaker
//!   abstractions, implemented over CPAL for real devices.
//! - [`CaptureSession`] — one recording lifecycle: armed on the start key,
//!   records on a worker thread until the stop or cancel key fires.
//! - [`PlaybackSession`] — one playback lifecycle: streams a decoded buffer
//!   while a concurrent stop-key listener can abort it mid-stream.

mod audio;
mod error;
mod hotkey;

pub use {
    audio::{
        AudioBuffer, AudioFormat, AudioSpec, CaptureKeys, CaptureOutcome, CaptureSession,
        CpalInput, CpalOutput, InputSource, OutputSink, PlaybackSession, PlaybackSource,
        PlaybackState, RecordingState, Resampler, decode, encode, transcode,
    },
    error::{AudioError, Result as CoreResult},
    hotkey::{HotkeyBus, HotkeyCallback, HotkeyGuard, HotkeyHandle, Key},
};

#[cfg(test)]
mod tests;
