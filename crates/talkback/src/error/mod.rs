use talkback_core::AudioError;

use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Application-level errors for the talkback binary.
///
/// All variants include `ErrorLocation` for call-site tracking.
#[derive(Error, Debug)]
pub enum AppError {
    /// Audio subsystem error from talkback-core.
    #[error("Audio error: {source} {location}")]
    Audio {
        /// The underlying audio error.
        #[source]
        source: AudioError,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Failed to register global hotkeys with the OS.
    #[error("Hotkey registration failed: {reason} {location}")]
    HotkeyRegistrationFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The speech recognizer returned no transcript for the capture.
    #[error("Speech was unintelligible or silent {location}")]
    EmptyTranscript {
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The speech recognition request failed or returned a bad payload.
    #[error("Transcription failed: {reason} {location}")]
    TranscriptionFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The conversational agent request failed.
    #[error("Agent request failed: {reason} {location}")]
    AgentRequestFailed {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The synthesis vendor rejected the request.
    #[error("Synthesis failed with status {status}: {detail} {location}")]
    SynthesisFailed {
        /// HTTP status code returned by the vendor.
        status: u16,
        /// The vendor's detail message, when one was present in the body.
        detail: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Transport-level HTTP error.
    #[error("HTTP error: {source} {location}")]
    HttpError {
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// Configuration loading or saving error.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// Human-readable reason for failure.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    IoError {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

// Manual From<AudioError> with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<AudioError> for AppError {
    #[track_caller]
    fn from(source: AudioError) -> Self {
        AppError::Audio {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for AppError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        AppError::HttpError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for AppError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        AppError::IoError {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
