//! Status delivery to the indicator process over its Unix socket

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;
use tracing::trace;

use crate::application::ports::{NotifyError, StatusSink};
use crate::domain::protocol::Notification;

/// Default path of the indicator's listening socket.
pub const DEFAULT_INDICATOR_SOCKET: &str = "/tmp/dictation_tray.sock";

/// Bound on the whole connect/send/ack exchange so a wedged indicator can
/// never stall the session.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// Best-effort status sink writing one frame per connection to the
/// indicator socket. The indicator may not be running at all; every failure
/// mode is reported as an error the caller logs and drops.
pub struct SocketStatusSink {
    path: PathBuf,
}

impl SocketStatusSink {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_INDICATOR_SOCKET),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn send_frame(&self, frame: &str) -> Result<(), NotifyError> {
        let mut stream = UnixStream::connect(&self.path)
            .await
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;

        stream
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;
        stream
            .shutdown()
            .await
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;

        // The indicator replies with a short ack; read and discard it.
        let mut ack = [0u8; 16];
        let _ = stream.read(&mut ack).await;
        Ok(())
    }
}

impl Default for SocketStatusSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusSink for SocketStatusSink {
    async fn notify(&self, event: &Notification) -> Result<(), NotifyError> {
        let frame = event.frame();
        trace!(frame = %frame, "notifying indicator");
        timeout(NOTIFY_TIMEOUT, self.send_frame(&frame))
            .await
            .map_err(|_| NotifyError::TimedOut)?
    }
}
