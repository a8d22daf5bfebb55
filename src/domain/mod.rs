//! Domain layer - Core business logic
//!
//! Contains value objects, the session state machine, audio processing,
//! the wire protocol, and domain errors.
//! This layer has no dependencies on external systems.

pub mod audio;
pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod session;

// Re-export common types
pub use audio::{AudioChunk, TARGET_SAMPLE_RATE};
pub use config::{AppConfig, ModelSize, Task, TranscribeRequest};
pub use device::{DeviceConfig, DeviceDescriptor};
pub use error::*;
pub use protocol::{Command, Notification};
pub use session::{Session, SessionState};
