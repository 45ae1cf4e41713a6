use crate::config::{default_voice_id, default_voice_setting};

use serde::{Deserialize, Serialize};

/// Speech synthesis voice configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Vendor voice identifier.
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    /// Voice stability, 0.0 to 1.0.
    #[serde(default = "default_voice_setting")]
    pub stability: f32,
    /// Voice similarity boost, 0.0 to 1.0.
    #[serde(default = "default_voice_setting")]
    pub similarity_boost: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: default_voice_id(),
            stability: default_voice_setting(),
            similarity_boost: default_voice_setting(),
        }
    }
}
