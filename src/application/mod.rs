//! Application layer - Use cases and port interfaces
//!
//! Orchestrates the domain entities and defines the traits that
//! infrastructure adapters implement.

pub mod capture;
pub mod ports;
pub mod resolver;
pub mod service;

pub use capture::{CaptureOutcome, CaptureWorker};
pub use resolver::{resolve, NoWorkingDeviceError, Resolution};
pub use service::{CommandHandler, DictationService};
