//! Application configuration value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::{InvalidModelError, InvalidTaskError};

/// Whisper model tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelSize {
    Tiny,
    #[default]
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = InvalidModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(Self::Tiny),
            "base" => Ok(Self::Base),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(InvalidModelError {
                input: other.to_string(),
            }),
        }
    }
}

/// What the model should do with the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Task {
    #[default]
    Transcribe,
    /// Translate speech to English.
    Translate,
}

impl Task {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::Translate => "translate",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Task {
    type Err = InvalidTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcribe" => Ok(Self::Transcribe),
            "translate" => Ok(Self::Translate),
            other => Err(InvalidTaskError {
                input: other.to_string(),
            }),
        }
    }
}

/// Settings handed to the transcriber on every call, so a config reload
/// takes effect on the next transcription without restarting the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscribeRequest {
    pub model: ModelSize,
    pub language: String,
    pub task: Task,
}

impl Default for TranscribeRequest {
    fn default() -> Self {
        Self {
            model: ModelSize::default(),
            language: "en".to_string(),
            task: Task::default(),
        }
    }
}

/// Persisted application configuration.
/// All recognized fields are optional; unknown keys are preserved across
/// load/save so external tooling can stash its own settings here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Consumed by the hotkey scripts, not by the daemon itself.
    pub hotkey: Option<String>,
    /// Preferred audio input device id. Auto-detected and persisted back
    /// when missing or no longer working.
    pub audio_device: Option<usize>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub task: Option<String>,
    #[serde(flatten)]
    pub extra: toml::value::Table,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            hotkey: Some("ctrl+alt+d".to_string()),
            audio_device: None,
            model: Some("base".to_string()),
            language: Some("en".to_string()),
            task: Some("transcribe".to_string()),
            extra: toml::value::Table::new(),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get model as parsed ModelSize, or the default if not set/invalid
    pub fn model_or_default(&self) -> ModelSize {
        self.model
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get language, or "en" if not set
    pub fn language_or_default(&self) -> String {
        self.language.clone().unwrap_or_else(|| "en".to_string())
    }

    /// Get task as parsed Task, or the default if not set/invalid
    pub fn task_or_default(&self) -> Task {
        self.task
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Build the transcription settings from this config.
    pub fn transcribe_request(&self) -> TranscribeRequest {
        TranscribeRequest {
            model: self.model_or_default(),
            language: self.language_or_default(),
            task: self.task_or_default(),
        }
    }
}
