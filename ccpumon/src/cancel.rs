//! Operator interrupt handling.
//!
//! The interrupt is observed by a dedicated task whose only action is to
//! cancel the token; the polling loop checks the token at its checkpoints.

use std::future::Future;
use std::io;

use log::warn;
use tokio::task::JoinHandle;
pub use tokio_util::sync::CancellationToken;

/// Spawn a task that cancels `token` on the first Ctrl-C.
///
/// The handler is installed before this returns, so an interrupt that
/// arrives while the caller blocks on something else is still caught.
/// Must be called from within a tokio runtime.
pub fn spawn_interrupt_listener(token: CancellationToken) -> JoinHandle<()> {
    let interrupt = interrupt();
    tokio::spawn(async move {
        tokio::select! {
            result = interrupt => match result {
                Ok(()) => token.cancel(),
                Err(e) => warn!("Failed to listen for interrupt: {}", e),
            },
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(unix)]
fn interrupt() -> impl Future<Output = io::Result<()>> + Send + 'static {
    use tokio::signal::unix::{SignalKind, signal};

    // Registered here rather than on first poll
    let registered = signal(SignalKind::interrupt());
    async move {
        registered?.recv().await;
        Ok(())
    }
}

#[cfg(not(unix))]
fn interrupt() -> impl Future<Output = io::Result<()>> + Send + 'static {
    tokio::signal::ctrl_c()
}
