//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::protocol::Command;

/// Dictation - local push-to-talk voice typing
#[derive(Parser, Debug)]
#[command(name = "dictation")]
#[command(version)]
#[command(about = "Local voice dictation daemon with whisper.cpp transcription")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Commands {
    /// Run the dictation daemon in the foreground
    Daemon,
    /// Toggle recording (start if idle, stop and transcribe if recording)
    Toggle,
    /// Discard the current recording without transcribing
    Discard,
    /// List audio input devices known to the daemon
    Devices,
    /// Reload configuration and re-resolve the audio device
    Reload,
}

impl Commands {
    /// The wire command a client subcommand maps to, if any.
    pub fn wire_command(&self) -> Option<Command> {
        match self {
            Self::Daemon => None,
            Self::Toggle => Some(Command::Toggle),
            Self::Discard => Some(Command::Discard),
            Self::Devices => Some(Command::ListDevices),
            Self::Reload => Some(Command::ReloadConfig),
        }
    }
}
