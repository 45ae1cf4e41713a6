//! Speech synthesis collaborators.

use crate::{AppError, AppResult, config::VoiceConfig};

use std::panic::Location;

use error_location::ErrorLocation;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use tracing::{info, instrument};

const SYNTHESIZE_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Turns reply text into speech audio.
pub trait Synthesizer: Send + Sync {
    /// Render `text` as encoded audio bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SynthesisFailed`] when the vendor rejects the
    /// request.
    fn synthesize(&self, text: &str) -> AppResult<Vec<u8>>;
}

/// ElevenLabs text-to-speech returning MP3 audio.
pub struct ElevenLabsSynthesizer {
    client: Client,
    api_key: String,
    voice: VoiceConfig,
}

impl ElevenLabsSynthesizer {
    /// Create a synthesizer for the configured voice.
    pub fn new(api_key: String, voice: VoiceConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            voice,
        }
    }
}

impl Synthesizer for ElevenLabsSynthesizer {
    #[track_caller]
    #[instrument(skip(self, text), fields(text_len = text.len(), voice_id = %self.voice.voice_id))]
    fn synthesize(&self, text: &str) -> AppResult<Vec<u8>> {
        let body = json!({
            "text": text,
            "voice_settings": {
                "stability": self.voice.stability,
                "similarity_boost": self.voice.similarity_boost,
            },
        });

        let response = self
            .client
            .post(format!("{}/{}", SYNTHESIZE_URL, self.voice.voice_id))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AppError::SynthesisFailed {
                status: status.as_u16(),
                detail: extract_detail(&body),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let audio = response.bytes()?.to_vec();
        info!(byte_count = audio.len(), "Synthesis complete");

        Ok(audio)
    }
}

/// Pull the vendor's `detail` field out of an error body, falling back to
/// the raw body when it is not the expected JSON shape.
pub(crate) fn extract_detail(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    match value.get("detail") {
        Some(Value::String(detail)) => detail.clone(),
        Some(detail) => detail.to_string(),
        None => body.to_string(),
    }
}
