//! Unix signal handling for the daemon

use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Wait until SIGINT or SIGTERM arrives.
pub async fn wait_for_shutdown() -> io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
    }
    Ok(())
}
