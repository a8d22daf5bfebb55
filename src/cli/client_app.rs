//! Client subcommand runner: send one command to the daemon and print the
//! response.

use std::process::ExitCode;

use crate::domain::protocol::Command;

use super::daemon_app::{EXIT_ERROR, EXIT_SUCCESS};
use super::server::{CommandClient, SocketPath};

pub async fn run_client(command: Command) -> ExitCode {
    let client = CommandClient::new(SocketPath::new());

    if !client.is_daemon_running() {
        eprintln!("Daemon is not running (start it with: dictation daemon)");
        return ExitCode::from(EXIT_ERROR);
    }

    match client.send(command).await {
        Ok(response) => {
            println!("{response}");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Failed to reach daemon: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
