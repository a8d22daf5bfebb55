//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Processing,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Processing => "processing",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("cannot {action} while in {current_state} state")]
pub struct InvalidTransition {
    pub current_state: SessionState,
    pub action: &'static str,
}

/// Recording session entity.
///
/// State machine:
///   IDLE -> RECORDING (start_recording)
///   RECORDING -> PROCESSING (stop_recording)
///   RECORDING -> IDLE (abort_recording)
///   PROCESSING -> IDLE (complete_processing)
///   IDLE -> PROCESSING (begin_maintenance, exclusive reload)
///
/// The session itself holds no locks; the service keeps it behind a single
/// mutex and holds that mutex only for the transition bookkeeping, never
/// across stream opens, joins, transcription, or notification sends.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_processing(&self) -> bool {
        self.state == SessionState::Processing
    }

    /// Transition from IDLE to RECORDING
    pub fn start_recording(&mut self) -> Result<(), InvalidTransition> {
        if self.state != SessionState::Idle {
            return Err(InvalidTransition {
                current_state: self.state,
                action: "start recording",
            });
        }
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Transition from RECORDING to PROCESSING
    pub fn stop_recording(&mut self) -> Result<(), InvalidTransition> {
        if self.state != SessionState::Recording {
            return Err(InvalidTransition {
                current_state: self.state,
                action: "stop recording",
            });
        }
        self.state = SessionState::Processing;
        Ok(())
    }

    /// Transition from RECORDING straight back to IDLE.
    ///
    /// Used when the stream failed to open after the optimistic transition,
    /// and by the capture-failure monitor.
    pub fn abort_recording(&mut self) -> Result<(), InvalidTransition> {
        if self.state != SessionState::Recording {
            return Err(InvalidTransition {
                current_state: self.state,
                action: "abort recording",
            });
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Transition from PROCESSING to IDLE
    pub fn complete_processing(&mut self) -> Result<(), InvalidTransition> {
        if self.state != SessionState::Processing {
            return Err(InvalidTransition {
                current_state: self.state,
                action: "complete processing",
            });
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Transition from IDLE to PROCESSING for an exclusive operation
    /// (configuration reload / device reconfiguration).
    pub fn begin_maintenance(&mut self) -> Result<(), InvalidTransition> {
        if self.state != SessionState::Idle {
            return Err(InvalidTransition {
                current_state: self.state,
                action: "reload configuration",
            });
        }
        self.state = SessionState::Processing;
        Ok(())
    }
}
