//! Dictation - local push-to-talk voice typing daemon
//!
//! Records from the microphone on a hotkey toggle, transcribes locally with
//! whisper.cpp, and types the result into the focused window.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Session state machine, wire protocol, audio math, config
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, whisper, ydotool, etc.)
//! - **CLI**: Command-line interface, control socket, and daemon lifecycle

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
