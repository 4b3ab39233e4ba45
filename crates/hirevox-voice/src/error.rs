//! Error types for the voice session.

use thiserror::Error;

/// Result type alias for voice operations.
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors that can occur in the voice session.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Audio playback error: {0}")]
    Playback(String),

    #[error("Audio payload decode error: {0}")]
    Decode(String),

    #[error("Live channel error: {0}")]
    Channel(String),

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::DevicesError> for VoiceError {
    fn from(err: cpal::DevicesError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for VoiceError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        VoiceError::AudioDevice(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for VoiceError {
    fn from(err: cpal::BuildStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for VoiceError {
    fn from(err: cpal::PlayStreamError) -> Self {
        VoiceError::AudioStream(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for VoiceError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        VoiceError::Channel(err.to_string())
    }
}

/// User-facing message for an incompatible model or project configuration.
pub const ERR_INCOMPATIBLE: &str = "Incompatible model or project configuration.";
/// User-facing message for everything else the channel can throw at us.
pub const ERR_NETWORK: &str = "Network error. Voice connection interrupted.";

/// Map a raw channel error to the message shown to the candidate. The
/// "entity not found" condition means the configured model is unavailable to
/// this project; all other failures are treated as transient network faults.
/// Neither triggers an automatic reconnect.
pub fn user_facing_channel_error(detail: &str) -> &'static str {
    if detail.contains("Requested entity was not found") {
        ERR_INCOMPATIBLE
    } else {
        ERR_NETWORK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_not_found_is_a_config_error() {
        let msg = user_facing_channel_error("Requested entity was not found.");
        assert_eq!(msg, ERR_INCOMPATIBLE);
    }

    #[test]
    fn everything_else_is_a_network_error() {
        assert_eq!(user_facing_channel_error("connection reset"), ERR_NETWORK);
        assert_eq!(user_facing_channel_error(""), ERR_NETWORK);
    }
}
