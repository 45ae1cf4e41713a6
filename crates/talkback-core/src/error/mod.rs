use error_location::ErrorLocation;
use thiserror::Error;

/// Audio session errors with source location tracking.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio output device found.
    #[error("No speaker found {location}")]
    NoSpeakerFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio requested before any successful recording completed.
    #[error("No audio captured {location}")]
    NoAudioCaptured {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Playback requested with nothing to play.
    #[error("No audio source supplied: {reason} {location}")]
    NoAudioSource {
        /// Why the source was unusable.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A session method was called while the session was already in flight.
    #[error("Session busy: {reason} {location}")]
    SessionBusy {
        /// Which operation collided with the in-flight one.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Container encoding failed or is unsupported.
    #[error("Encoding error: {reason} {location}")]
    EncodingError {
        /// Description of the encoding failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Container decoding failed.
    #[error("Decoding error: {reason} {location}")]
    DecodingError {
        /// Description of the decoding failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio resampling failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Hotkey registration or dispatch failed.
    #[error("Hotkey error: {reason} {location}")]
    HotkeyError {
        /// Description of the hotkey failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Result type alias using [`AudioError`].
pub type Result<T> = std::result::Result<T, AudioError>;
