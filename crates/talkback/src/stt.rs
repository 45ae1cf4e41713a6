//! Speech recognition collaborators.

use crate::{AppError, AppResult};

use std::panic::Location;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use error_location::ErrorLocation;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use talkback_core::AudioBuffer;
use tracing::{debug, info, instrument};

const RECOGNIZE_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";

/// Turns captured audio into text.
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio` to text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::EmptyTranscript`] if nothing intelligible was
    /// said, or [`AppError::TranscriptionFailed`] for request failures.
    fn transcribe(&self, audio: &AudioBuffer) -> AppResult<String>;
}

/// Google Cloud Speech-to-Text over the synchronous recognize endpoint.
pub struct GoogleSpeechToText {
    client: Client,
    api_key: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognizeResult>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResult {
    #[serde(default)]
    alternatives: Vec<RecognizeAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognizeAlternative {
    #[serde(default)]
    transcript: String,
}

impl GoogleSpeechToText {
    /// Create a recognizer for `language` authenticated with `api_key`.
    pub fn new(api_key: String, language: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            language,
        }
    }
}

impl Transcriber for GoogleSpeechToText {
    #[track_caller]
    #[instrument(skip(self, audio), fields(byte_count = audio.len()))]
    fn transcribe(&self, audio: &AudioBuffer) -> AppResult<String> {
        let body = json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": audio.spec().sample_rate,
                "languageCode": self.language,
            },
            "audio": {
                "content": STANDARD.encode(audio.bytes()),
            },
        });

        let response = self
            .client
            .post(RECOGNIZE_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(AppError::TranscriptionFailed {
                reason: format!("Recognize request returned {}: {}", status, text),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let transcript = parse_transcript(&text)?;
        info!(transcript = %transcript, "Transcription complete");

        Ok(transcript)
    }
}

/// Extract the concatenated transcript from a recognize response body.
///
/// # Errors
///
/// Returns [`AppError::EmptyTranscript`] when the recognizer produced no
/// results, or [`AppError::TranscriptionFailed`] for an unparseable body.
#[track_caller]
pub(crate) fn parse_transcript(body: &str) -> AppResult<String> {
    let response: RecognizeResponse =
        serde_json::from_str(body).map_err(|e| AppError::TranscriptionFailed {
            reason: format!("Failed to parse recognize response: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    debug!(result_count = response.results.len(), "Recognize response parsed");

    let transcript: String = response
        .results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alternative| alternative.transcript.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    if transcript.trim().is_empty() {
        return Err(AppError::EmptyTranscript {
            location: ErrorLocation::from(Location::caller()),
        });
    }

    Ok(transcript)
}
