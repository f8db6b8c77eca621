//! Interrupt handling.

use std::future::Future;

use log::debug;

use crate::error::{ControlError, Result};

/// Registers the shutdown signal handlers and returns a future resolving on
/// the first interrupt.
///
/// Handlers are installed before this returns, so a signal delivered while a
/// command is running is not lost.
#[cfg(unix)]
pub fn listen() -> Result<impl Future<Output = Result<()>>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt()).map_err(ControlError::Signal)?;
    let mut terminate = signal(SignalKind::terminate()).map_err(ControlError::Signal)?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => debug!("Received SIGINT"),
            _ = terminate.recv() => debug!("Received SIGTERM"),
        }
        Ok(())
    })
}

#[cfg(not(unix))]
pub fn listen() -> Result<impl Future<Output = Result<()>>> {
    Ok(async {
        tokio::signal::ctrl_c().await.map_err(ControlError::Signal)?;
        debug!("Received Ctrl-C");
        Ok(())
    })
}
