//! Status indicator adapters

pub mod socket;

pub use socket::SocketStatusSink;
