//! The fatal-error channel.
//!
//! Every task that can end the process (the service loop, run-hooks) holds a
//! [`FatalSender`]; the supervisor holds the single [`FatalReceiver`]. Only the
//! first error matters, so the channel holds one value and sends never wait:
//! a full or closed channel drops the report.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::lifecycle::error::LifecycleError;

/// Create a fatal-error channel.
pub fn fatal_channel() -> (FatalSender, FatalReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (FatalSender { tx }, FatalReceiver { rx })
}

/// Producer half. Cheap to clone, never blocks.
#[derive(Debug, Clone)]
pub struct FatalSender {
    tx: mpsc::Sender<LifecycleError>,
}

impl FatalSender {
    /// Report a fatal error.
    ///
    /// Returns `true` if the error was queued for the supervisor. A `false`
    /// return means another error got there first, or the supervisor has
    /// already stopped listening.
    pub fn report(&self, err: LifecycleError) -> bool {
        match self.tx.try_send(err) {
            Ok(()) => true,
            Err(TrySendError::Full(err)) => {
                tracing::debug!(error = %err, "Fatal error already pending, dropping report");
                false
            }
            Err(TrySendError::Closed(err)) => {
                tracing::debug!(error = %err, "Supervisor no longer listening, dropping report");
                false
            }
        }
    }
}

/// Consumer half, owned by the supervisor's signal waiter.
#[derive(Debug)]
pub struct FatalReceiver {
    rx: mpsc::Receiver<LifecycleError>,
}

impl FatalReceiver {
    /// Wait for the first fatal error.
    ///
    /// Returns `None` when every sender is gone without reporting.
    pub async fn recv(&mut self) -> Option<LifecycleError> {
        self.rx.recv().await
    }
}
