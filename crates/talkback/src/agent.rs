//! Conversational agent collaborators.

use crate::{AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Answers a transcribed question with reply text.
pub trait ConversationalAgent: Send + Sync {
    /// Produce a reply to `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AgentRequestFailed`] when no reply could be
    /// obtained.
    fn ask(&self, prompt: &str) -> AppResult<String>;
}

/// OpenAI chat-completions agent.
pub struct OpenAiAgent {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiAgent {
    /// Create an agent answering with `model`.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }
}

impl ConversationalAgent for OpenAiAgent {
    #[track_caller]
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %self.model))]
    fn ask(&self, prompt: &str) -> AppResult<String> {
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(AppError::AgentRequestFailed {
                reason: format!("Chat request returned {}: {}", status, text),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| AppError::AgentRequestFailed {
                reason: format!("Failed to parse chat response: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::AgentRequestFailed {
                reason: "Chat response contained no choices".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(reply_len = reply.len(), "Agent replied");

        Ok(reply)
    }
}
