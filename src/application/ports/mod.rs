//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio;
pub mod config;
pub mod injector;
pub mod status;
pub mod transcriber;

// Re-export common types
pub use audio::{AudioError, AudioInput, CaptureStreamError, ProbeFailure, StreamGuard};
pub use config::ConfigStore;
pub use injector::{InjectionError, TextInjector};
pub use status::{NotifyError, StatusSink};
pub use transcriber::{Transcriber, TranscriptionError};
