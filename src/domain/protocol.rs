//! Wire protocol for the control socket and the indicator socket.
//!
//! Both sockets speak newline-free single-frame text. Commands are decoded
//! once at the protocol boundary into a closed enum; unknown input is an
//! explicit [`InvalidCommand`] outcome, never a fatal error.

use std::fmt;
use thiserror::Error;

/// A control command received on the daemon socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start recording when idle, stop-and-transcribe when recording.
    Toggle,
    /// Drop an in-flight recording without transcription.
    Discard,
    /// List enumerated audio input devices.
    ListDevices,
    /// Re-run configuration load, device resolution, and model selection.
    ReloadConfig,
}

impl Command {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Toggle => "TOGGLE",
            Self::Discard => "DISCARD",
            Self::ListDevices => "LIST_DEVICES",
            Self::ReloadConfig => "RELOAD_CONFIG",
        }
    }

    /// Decode a received frame. Surrounding whitespace is ignored.
    pub fn parse(frame: &str) -> Result<Self, InvalidCommand> {
        match frame.trim() {
            "TOGGLE" => Ok(Self::Toggle),
            "DISCARD" => Ok(Self::Discard),
            "LIST_DEVICES" => Ok(Self::ListDevices),
            "RELOAD_CONFIG" => Ok(Self::ReloadConfig),
            other => Err(InvalidCommand {
                input: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for an unrecognized command frame
#[derive(Debug, Clone, Error)]
#[error("invalid command: {input:?}")]
pub struct InvalidCommand {
    pub input: String,
}

/// One-way, best-effort status event for the indicator process.
///
/// Never load-bearing: the session's correctness does not depend on
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    RecordingStarted,
    RecordingStopped,
    /// Processing finished. `Some(text)` carries the transcript; `None` is
    /// the neutral form used after a discard or a failed capture so the
    /// indicator returns to idle.
    Processed(Option<String>),
    ConfigChanged,
    /// Ask a typing helper to inject text.
    Type(String),
    /// Ask the indicator process to exit.
    Quit,
}

impl Notification {
    /// Encode as a wire frame for the indicator socket.
    pub fn frame(&self) -> String {
        match self {
            Self::RecordingStarted => "RECORDING_STARTED".to_string(),
            Self::RecordingStopped => "RECORDING_STOPPED".to_string(),
            Self::Processed(None) => "PROCESSED".to_string(),
            Self::Processed(Some(text)) => format!("PROCESSED: \"{}\"", text),
            Self::ConfigChanged => "CONFIG_CHANGED".to_string(),
            Self::Type(text) => format!("TYPE:{}", text),
            Self::Quit => "QUIT".to_string(),
        }
    }
}
