//! Unix Domain Socket command server and client
//!
//! One request frame per connection: the client writes a command, the
//! daemon writes the response and closes. The socket is world-writable so
//! hotkey scripts running as other users can reach the daemon.

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use crate::application::CommandHandler;
use crate::domain::protocol::Command;

/// Default path of the daemon's control socket.
pub const DEFAULT_CONTROL_SOCKET: &str = "/tmp/dictation.sock";

/// Commands are short fixed tokens; anything longer is garbage.
const MAX_FRAME_LEN: usize = 1024;

/// Response sent for frames that don't decode to a known command.
const RESP_INVALID: &str = "Invalid command";

/// Socket path resolver
#[derive(Debug, Clone)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONTROL_SOCKET),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Control socket server dispatching decoded commands to a handler.
pub struct CommandServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl CommandServer {
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }

    /// Bind, replacing any stale socket file from a previous run.
    pub fn bind(&mut self) -> io::Result<()> {
        self.socket_path.cleanup()?;

        let listener = UnixListener::bind(self.socket_path.path())?;
        std::fs::set_permissions(
            self.socket_path.path(),
            std::fs::Permissions::from_mode(0o666),
        )?;
        self.listener = Some(listener);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.socket_path.path()
    }

    /// Accept connections forever, handling each on its own task so a slow
    /// transcription never blocks the accept loop.
    pub async fn run<H>(&self, handler: Arc<H>) -> io::Result<()>
    where
        H: CommandHandler + 'static,
    {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handler).await {
                            warn!(error = %e, "socket connection error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "socket accept error");
                }
            }
        }
    }

    pub fn cleanup(&self) {
        let _ = self.socket_path.cleanup();
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Handle a single client connection: one frame in, one response out.
async fn handle_connection<H>(mut stream: UnixStream, handler: Arc<H>) -> io::Result<()>
where
    H: CommandHandler + 'static,
{
    let mut buf = vec![0u8; MAX_FRAME_LEN];
    let n = stream.read(&mut buf).await?;
    let frame = String::from_utf8_lossy(&buf[..n]);

    let response = match Command::parse(&frame) {
        Ok(command) => {
            debug!(command = %command, "received command");
            handler.handle_command(command).await
        }
        Err(e) => {
            warn!(error = %e, "unrecognized command frame");
            RESP_INVALID.to_string()
        }
    };

    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// Control socket client used by the CLI subcommands.
pub struct CommandClient {
    socket_path: SocketPath,
}

impl CommandClient {
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }

    /// Check if the daemon appears to be running (socket exists)
    pub fn is_daemon_running(&self) -> bool {
        self.socket_path.exists()
    }

    /// Send a command and wait for the daemon's response.
    pub async fn send(&self, command: Command) -> io::Result<String> {
        let mut stream = UnixStream::connect(self.socket_path.path()).await?;

        stream.write_all(command.as_str().as_bytes()).await?;
        stream.shutdown().await?;

        let mut response = String::new();
        stream.read_to_string(&mut response).await?;
        Ok(response)
    }
}
