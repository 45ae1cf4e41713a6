use crate::{
    AppError, AppResult,
    config::{default_channels, default_chunk_frames, default_container, default_sample_rate},
};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use talkback_core::{AudioFormat, AudioSpec};

/// Capture and playback format configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate recordings are stored at.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Channel count; only mono is meaningful for speech recognition.
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Frames pulled from the device per chunk.
    #[serde(default = "default_chunk_frames")]
    pub chunk_frames: usize,
    /// Container recordings are encoded into ("wav" or "pcm").
    #[serde(default = "default_container")]
    pub container: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            chunk_frames: default_chunk_frames(),
            container: default_container(),
        }
    }
}

impl AudioConfig {
    /// The configured recording spec.
    pub fn spec(&self) -> AudioSpec {
        AudioSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
        }
    }

    /// The configured recording container.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ConfigError`] for an unknown container name.
    #[track_caller]
    pub fn container(&self) -> AppResult<AudioFormat> {
        match self.container.as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "pcm" => Ok(AudioFormat::Pcm),
            other => Err(AppError::ConfigError {
                reason: format!(
                    "audio.container must be \"wav\" or \"pcm\", got {:?}",
                    other
                ),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
