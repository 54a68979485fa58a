// Server module entry
// Listener setup, connection serving, the accept loop and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted under another name
#[path = "loop.rs"]
pub mod server_loop;

use std::net::SocketAddr;

pub use listener::create_reusable_listener;
pub use server_loop::{run_server_loop, wait_for_drain};
pub use signal::{install_signal_handler, shutdown_channel};

/// Errors that stop the server from starting or running
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid listen address: {0}")]
    Address(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}
