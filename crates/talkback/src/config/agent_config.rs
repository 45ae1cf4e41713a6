use crate::config::default_agent_model;

use serde::{Deserialize, Serialize};

/// Conversational agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Chat model the agent answers with.
    #[serde(default = "default_agent_model")]
    pub model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_agent_model(),
        }
    }
}
