//! Infrastructure layer - Adapters for external systems
//!
//! Implementations of the application-layer ports: audio capture,
//! speech-to-text, keystroke injection, status signaling, and
//! configuration storage.

pub mod audio;
pub mod config;
pub mod keystroke;
pub mod status;
pub mod transcription;
