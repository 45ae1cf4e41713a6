use crate::{
    AppError, AppResult,
    config::{default_cancel_key, default_quit_key, default_start_key, default_stop_key},
};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use talkback_core::{CaptureKeys, Key};

/// Keyboard bindings for the conversation loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Starts a recording turn.
    #[serde(default = "default_start_key")]
    pub start: String,
    /// Stops recording (and interrupts playback).
    #[serde(default = "default_stop_key")]
    pub stop: String,
    /// Cancels recording, discarding the audio.
    #[serde(default = "default_cancel_key")]
    pub cancel: String,
    /// Shuts the assistant down.
    #[serde(default = "default_quit_key")]
    pub quit: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            start: default_start_key(),
            stop: default_stop_key(),
            cancel: default_cancel_key(),
            quit: default_quit_key(),
        }
    }
}

impl KeysConfig {
    /// The capture bindings parsed into [`Key`]s.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ConfigError`] if any binding is not a single
    /// ASCII alphanumeric character.
    #[track_caller]
    pub fn capture_keys(&self) -> AppResult<CaptureKeys> {
        Ok(CaptureKeys {
            start: parse_key("keys.start", &self.start)?,
            stop: parse_key("keys.stop", &self.stop)?,
            cancel: parse_key("keys.cancel", &self.cancel)?,
        })
    }

    /// The playback interruption key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ConfigError`] if the binding is invalid.
    #[track_caller]
    pub fn stop_key(&self) -> AppResult<Key> {
        parse_key("keys.stop", &self.stop)
    }

    /// The shutdown key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ConfigError`] if the binding is invalid.
    #[track_caller]
    pub fn quit_key(&self) -> AppResult<Key> {
        parse_key("keys.quit", &self.quit)
    }
}

/// Parse a single-character binding into a [`Key`].
#[track_caller]
pub(crate) fn parse_key(field: &str, symbol: &str) -> AppResult<Key> {
    let mut chars = symbol.chars();
    let (Some(first), None) = (chars.next(), chars.next()) else {
        return Err(AppError::ConfigError {
            reason: format!("{} must be a single character, got {:?}", field, symbol),
            location: ErrorLocation::from(Location::caller()),
        });
    };

    Key::from_char(first).ok_or_else(|| AppError::ConfigError {
        reason: format!(
            "{} must be an ASCII letter or digit, got {:?}",
            field, symbol
        ),
        location: ErrorLocation::from(Location::caller()),
    })
}
