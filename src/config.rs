//! Configuration parsing and management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::WindowKind;
use crate::error::{ConfigError, LipsyncError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lipsync: LipsyncConfig,
    pub blendshapes: BlendshapeNames,
    pub audio: AudioConfig,
    /// Ordered clip slots, addressed by index in `Play(slot)`
    pub clips: Vec<ClipSlotConfig>,
    /// Timed `Play(slot)` triggers
    pub cues: Vec<CueConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LipsyncError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, LipsyncError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, LipsyncError> {
        let paths = [
            PathBuf::from("lipsync.toml"),
            PathBuf::from("config/lipsync.toml"),
            dirs_path().join("lipsync.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LipsyncError> {
        self.lipsync.validate()?;

        if self.audio.tick_rate_hz == 0 {
            return Err(ConfigError::invalid(
                "audio.tick_rate_hz",
                "Tick rate must be greater than 0",
            )
            .into());
        }

        if self.audio.capture_buffer_size == 0 {
            return Err(ConfigError::invalid(
                "audio.capture_buffer_size",
                "Capture buffer size must be greater than 0",
            )
            .into());
        }

        for (i, cue) in self.cues.iter().enumerate() {
            if let Err(e) = std::time::Duration::try_from_secs_f64(cue.at_secs) {
                return Err(ConfigError::invalid(
                    &format!("cues[{}].at_secs", i),
                    format!("Cue time must be a non-negative number of seconds: {}", e),
                )
                .into());
            }
            if cue.slot >= self.clips.len() {
                tracing::warn!(
                    "Cue {} targets slot {} but only {} clip slots are configured",
                    i,
                    cue.slot,
                    self.clips.len()
                );
            }
        }

        Ok(())
    }
}

/// Analysis and smoothing parameters for one lipsync session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipsyncConfig {
    /// Voice pitch factor scaling the band boundaries
    pub pitch: f32,
    /// Minimum summed speech-band energy before normalization kicks in
    pub volume_threshold: f32,
    /// Maximum weight change per tick (weights are 0-100)
    pub max_lip_speed: f32,
    /// Number of magnitude bins per spectrum snapshot
    pub spectrum_size: usize,
    /// Analysis window applied before the FFT
    pub window: WindowKind,
}

impl Default for LipsyncConfig {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            volume_threshold: 1e-4,
            max_lip_speed: 10.0,
            spectrum_size: 256,
            window: WindowKind::BlackmanHarris,
        }
    }
}

impl LipsyncConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pitch(self.pitch)?;

        if !self.volume_threshold.is_finite() || self.volume_threshold < 0.0 {
            return Err(ConfigError::invalid(
                "lipsync.volume_threshold",
                "Threshold must be a finite value >= 0",
            ));
        }

        if !self.max_lip_speed.is_finite() || self.max_lip_speed <= 0.0 {
            return Err(ConfigError::invalid(
                "lipsync.max_lip_speed",
                "Lip speed must be a finite value > 0",
            ));
        }

        if !self.spectrum_size.is_power_of_two() || !(64..=8192).contains(&self.spectrum_size) {
            return Err(ConfigError::invalid(
                "lipsync.spectrum_size",
                "Spectrum size must be a power of two between 64 and 8192",
            ));
        }

        Ok(())
    }
}

/// Check that a pitch factor is usable for scaling band boundaries
pub fn validate_pitch(pitch: f32) -> Result<(), ConfigError> {
    if pitch.is_finite() && pitch > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "lipsync.pitch",
            format!("Pitch must be a finite value > 0 (got {})", pitch),
        ))
    }
}

/// Mesh blendshape names for the three mouth channels.
///
/// An empty name keeps the channel on its default index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendshapeNames {
    pub kiss: String,
    pub lips_closed: String,
    pub mouth_open: String,
}

/// Audio/frame clock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Frame ticks per second
    pub tick_rate_hz: u32,
    /// Buffer size in samples for live capture slots
    pub capture_buffer_size: u32,
    /// Channel count requested from capture devices
    pub capture_channels: u16,
    /// Sample rate requested from capture devices
    pub capture_sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            capture_buffer_size: 512,
            capture_channels: 1,
            capture_sample_rate: 48000,
        }
    }
}

/// One clip slot binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum ClipSlotConfig {
    /// Clip decoded from a WAV file
    Wav { path: PathBuf },
    /// Live input device ("default" or a name fragment)
    Capture { device: String },
    /// Unbound slot
    Empty,
}

/// Timed playback trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueConfig {
    /// Seconds since start
    pub at_secs: f64,
    /// Clip slot to play
    pub slot: usize,
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("fushigi3d");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/fushigi3d");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/fushigi3d");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("fushigi3d");
        }
    }

    PathBuf::from(".")
}
