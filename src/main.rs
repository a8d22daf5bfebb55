//! Dictation CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dictation::cli::{
    args::{Cli, Commands},
    client_app::run_client,
    daemon_app::run_daemon,
};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .init();
            run_daemon().await
        }
        command => match command.wire_command() {
            Some(wire) => run_client(wire).await,
            None => ExitCode::FAILURE,
        },
    }
}
