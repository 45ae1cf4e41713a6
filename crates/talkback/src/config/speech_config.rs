use crate::config::default_language;

use serde::{Deserialize, Serialize};

/// Speech recognition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// BCP-47 language code sent with recognition requests.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}
