mod agent_config;
mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod keys_config;
mod speech_config;
mod voice_config;

pub(crate) use {
    agent_config::AgentConfig, audio_config::AudioConfig, config::Config,
    keys_config::KeysConfig, speech_config::SpeechConfig, voice_config::VoiceConfig,
};

pub(crate) const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub(crate) const DEFAULT_CHANNELS: u16 = 1;
pub(crate) const DEFAULT_CHUNK_FRAMES: usize = 1024;
pub(crate) const DEFAULT_CONTAINER: &str = "wav";
pub(crate) const DEFAULT_LANGUAGE: &str = "en-US";
pub(crate) const DEFAULT_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";
pub(crate) const DEFAULT_AGENT_MODEL: &str = "gpt-4o-mini";

pub(crate) fn default_start_key() -> String {
    "c".to_string()
}

pub(crate) fn default_stop_key() -> String {
    "s".to_string()
}

pub(crate) fn default_cancel_key() -> String {
    "x".to_string()
}

pub(crate) fn default_quit_key() -> String {
    "q".to_string()
}

pub(crate) fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

pub(crate) fn default_channels() -> u16 {
    DEFAULT_CHANNELS
}

pub(crate) fn default_chunk_frames() -> usize {
    DEFAULT_CHUNK_FRAMES
}

pub(crate) fn default_container() -> String {
    DEFAULT_CONTAINER.to_string()
}

pub(crate) fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

pub(crate) fn default_voice_id() -> String {
    DEFAULT_VOICE_ID.to_string()
}

pub(crate) fn default_voice_setting() -> f32 {
    0.0
}

pub(crate) fn default_agent_model() -> String {
    DEFAULT_AGENT_MODEL.to_string()
}
