//! Error types for the lipsync pipeline

use thiserror::Error;

/// Main error type for fushigi3d-lipsync
#[derive(Error, Debug)]
pub enum LipsyncError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Blendshape binding error: {0}")]
    Binding(#[from] BindingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio-related errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio device found")]
    NoDeviceFound,

    #[error("Failed to enumerate audio devices: {0}")]
    DeviceEnumeration(String),

    #[error("Failed to get default input device")]
    NoDefaultInput,

    #[error("Failed to get supported config: {0}")]
    UnsupportedConfig(String),

    #[error("Failed to build input stream: {0}")]
    StreamBuild(String),

    #[error("Failed to start audio stream: {0}")]
    StreamStart(String),

    #[error("Failed to decode clip {path}: {message}")]
    Decode { path: String, message: String },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration value: {field} - {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Blendshape channel resolution errors.
///
/// These never escape the pipeline: the binding falls back to a default index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("No blendshape name configured for channel {0}")]
    EmptyName(String),

    #[error("Blendshape not found on mesh: {0}")]
    NotFound(String),
}

/// Clip slot playback errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Clip slot {slot} out of range ({len} slots)")]
    SlotOutOfRange { slot: usize, len: usize },

    #[error("Clip slot {0} is not bound")]
    UnboundSlot(usize),

    #[error("Clip slot {0} has no clip loaded")]
    MissingClip(usize),

    #[error("Clip slot {slot} failed to start: {reason}")]
    Start { slot: usize, reason: String },
}

/// Result type alias for lipsync operations
pub type Result<T> = std::result::Result<T, LipsyncError>;
