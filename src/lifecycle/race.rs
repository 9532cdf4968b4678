//! The fatal-error / signal race and the default signal waiter.

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::fatal::FatalReceiver;
use crate::lifecycle::signals::{self, ShutdownSignal, SignalAction, SignalSubscription};

/// Whichever event resolved the race.
#[derive(Debug)]
pub enum RaceOutcome {
    /// A task reported a fatal error.
    Fatal(LifecycleError),
    /// A subscribed signal was delivered.
    Signal(ShutdownSignal),
    /// Both sources are exhausted; nothing will ever arrive.
    Closed,
}

/// How the supervisor must stop.
#[derive(Debug)]
pub enum ShutdownOutcome {
    /// Nothing to act on; return without draining or closing.
    NoAction,
    /// Close immediately and surface the error.
    ForceExit(LifecycleError),
    /// Drain under the exit deadline.
    GracefulShutdown,
}

impl ShutdownOutcome {
    /// Short stable label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownOutcome::NoAction => "no_action",
            ShutdownOutcome::ForceExit(_) => "force_exit",
            ShutdownOutcome::GracefulShutdown => "graceful",
        }
    }
}

/// The custom signal-waiter contract: `Err` forces, `Ok` drains.
impl From<Result<(), LifecycleError>> for ShutdownOutcome {
    fn from(result: Result<(), LifecycleError>) -> Self {
        match result {
            Ok(()) => ShutdownOutcome::GracefulShutdown,
            Err(err) => ShutdownOutcome::ForceExit(err),
        }
    }
}

/// Block until a fatal error or a subscribed signal arrives.
///
/// First ready wins. When both are ready at once either may be returned.
pub async fn race(fatal: &mut FatalReceiver, subscription: &mut SignalSubscription) -> RaceOutcome {
    tokio::select! {
        Some(err) = fatal.recv() => RaceOutcome::Fatal(err),
        Some(sig) = subscription.recv() => RaceOutcome::Signal(sig),
        else => RaceOutcome::Closed,
    }
}

/// Default signal waiter.
///
/// SIGTERM forces an immediate stop; SIGINT and SIGHUP (when watched) request
/// a graceful drain; any fatal error forces a stop.
pub async fn wait_signal(
    mut fatal: FatalReceiver,
    mut subscription: SignalSubscription,
) -> ShutdownOutcome {
    match race(&mut fatal, &mut subscription).await {
        RaceOutcome::Fatal(err) => ShutdownOutcome::ForceExit(err),
        RaceOutcome::Signal(signal) => decide(signal, signals::hangup_ignored()),
        RaceOutcome::Closed => ShutdownOutcome::NoAction,
    }
}

fn decide(signal: ShutdownSignal, hangup_ignored: bool) -> ShutdownOutcome {
    match signals::classify(signal, hangup_ignored) {
        Some(SignalAction::ForceExit) => {
            ShutdownOutcome::ForceExit(LifecycleError::ForceSignal { signal })
        }
        Some(SignalAction::GracefulShutdown) => {
            tracing::info!(signal = %signal, "Received signal");
            ShutdownOutcome::GracefulShutdown
        }
        None => {
            tracing::warn!(signal = %signal, "Received unwatched signal, ignoring");
            ShutdownOutcome::NoAction
        }
    }
}
