//! Status notification port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::protocol::Notification;

/// Notification delivery errors. Always logged and swallowed by the caller;
/// the session's correctness never depends on the indicator receiving the
/// message.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("indicator unreachable: {0}")]
    Unreachable(String),

    #[error("notification send timed out")]
    TimedOut,

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Port for one-way, best-effort status signaling to the indicator process.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// At-most-once attempt with a short internal timeout.
    async fn notify(&self, event: &Notification) -> Result<(), NotifyError>;
}

/// Blanket implementation for shared sink handles
#[async_trait]
impl<T: StatusSink + ?Sized> StatusSink for std::sync::Arc<T> {
    async fn notify(&self, event: &Notification) -> Result<(), NotifyError> {
        self.as_ref().notify(event).await
    }
}
