// Signal handling module
//
// - SIGTERM: graceful shutdown (sent by the orchestrator)
// - SIGINT:  graceful shutdown (Ctrl+C)

use tokio::sync::watch;

use super::ServerError;
use crate::logger;

/// Shutdown flag shared by the accept loop and every open connection
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Resolve once shutdown has been requested. Returns `false` when the sender
/// is gone without ever requesting it.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) -> bool {
    shutdown.wait_for(|stop| *stop).await.is_ok()
}

/// Register SIGINT/SIGTERM handlers and flip `shutdown` on the first one
/// received. Registration happens before this returns so early signals are
/// not lost.
#[cfg(unix)]
pub fn install_signal_handler(shutdown: watch::Sender<bool>) -> Result<(), ServerError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).map_err(ServerError::Signal)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(ServerError::Signal)?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_shutdown_requested(name);
        let _ = shutdown.send(true);
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn install_signal_handler(shutdown: watch::Sender<bool>) -> Result<(), ServerError> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                logger::log_shutdown_requested("Ctrl+C");
                let _ = shutdown.send(true);
            }
            Err(e) => logger::log_error(&format!("Failed to listen for Ctrl+C: {e}")),
        }
    });
    Ok(())
}
