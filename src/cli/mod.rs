//! CLI layer - argument parsing, socket server/client, daemon lifecycle

pub mod args;
pub mod client_app;
pub mod daemon_app;
pub mod pid_file;
pub mod server;
pub mod signals;

pub use args::{Cli, Commands};
pub use server::{CommandClient, CommandServer, SocketPath};
