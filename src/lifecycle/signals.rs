//! OS signal handling.
//!
//! # Responsibilities
//! - Classify termination signals as force-exit or graceful-shutdown
//! - Subscribe only to the signals the supervisor acts on
//! - Own the subscription so it is torn down with the supervisor
//!
//! # Design Decisions
//! - SIGTERM forces an immediate stop
//! - SIGINT and SIGHUP trigger a graceful drain
//! - SIGHUP is not watched at all when the process was started with it ignored
//!   (e.g. under `nohup`)

use std::fmt;
use std::sync::OnceLock;

/// A termination signal the supervisor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownSignal {
    /// SIGINT, Ctrl-C.
    Interrupt,
    /// SIGHUP, controlling terminal closed.
    Hangup,
    /// SIGTERM, the default kill signal.
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownSignal::Interrupt => "interrupt",
            ShutdownSignal::Hangup => "hangup",
            ShutdownSignal::Terminate => "terminated",
        };
        f.write_str(name)
    }
}

/// What the supervisor does when a signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Close the service immediately, no drain.
    ForceExit,
    /// Stop accepting work and drain in-flight requests under a deadline.
    GracefulShutdown,
}

/// Classify a delivered signal.
///
/// Returns `None` for a hangup while the process ignores SIGHUP; such a signal
/// is never subscribed to and must not trigger a shutdown.
pub fn classify(signal: ShutdownSignal, hangup_ignored: bool) -> Option<SignalAction> {
    match signal {
        ShutdownSignal::Terminate => Some(SignalAction::ForceExit),
        ShutdownSignal::Interrupt => Some(SignalAction::GracefulShutdown),
        ShutdownSignal::Hangup if hangup_ignored => None,
        ShutdownSignal::Hangup => Some(SignalAction::GracefulShutdown),
    }
}

/// The set of signals to subscribe to.
pub fn watched_signals(hangup_ignored: bool) -> Vec<ShutdownSignal> {
    if hangup_ignored {
        vec![ShutdownSignal::Interrupt, ShutdownSignal::Terminate]
    } else {
        vec![
            ShutdownSignal::Interrupt,
            ShutdownSignal::Hangup,
            ShutdownSignal::Terminate,
        ]
    }
}

static HANGUP_IGNORED: OnceLock<bool> = OnceLock::new();

/// Whether SIGHUP was set to `SIG_IGN` when the process started.
///
/// The disposition is read once and memoized: after the first subscription
/// installs a handler the live disposition no longer says "ignored".
pub fn hangup_ignored() -> bool {
    *HANGUP_IGNORED.get_or_init(query_hangup_ignored)
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn query_hangup_ignored() -> bool {
    // SAFETY: a null `act` only reads the current disposition into `current`,
    // which is a zero-initialized, properly sized `sigaction`.
    unsafe {
        let mut current: libc::sigaction = std::mem::zeroed();
        if libc::sigaction(libc::SIGHUP, std::ptr::null(), &mut current) != 0 {
            tracing::warn!(
                error = %std::io::Error::last_os_error(),
                "Failed to read SIGHUP disposition, assuming not ignored"
            );
            return false;
        }
        current.sa_sigaction == libc::SIG_IGN
    }
}

#[cfg(not(unix))]
fn query_hangup_ignored() -> bool {
    true
}

/// A live subscription to the classified shutdown signals.
///
/// Created when the supervisor starts and dropped at its terminal state;
/// dropping it releases the underlying signal streams.
#[cfg(unix)]
pub struct SignalSubscription {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl SignalSubscription {
    /// Subscribe to every signal the supervisor will act on.
    pub fn new() -> std::io::Result<Self> {
        Self::with_hangup(!hangup_ignored())
    }

    /// Subscribe to SIGINT and SIGTERM, and to SIGHUP when `hangup` is set.
    pub fn with_hangup(hangup: bool) -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let subscription = Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: if hangup {
                Some(signal(SignalKind::hangup())?)
            } else {
                None
            },
        };
        tracing::debug!(signals = ?subscription.watched(), "Subscribed to shutdown signals");
        Ok(subscription)
    }

    /// The signals this subscription listens for.
    pub fn watched(&self) -> Vec<ShutdownSignal> {
        watched_signals(self.hangup.is_none())
    }

    /// Wait for the next subscribed signal.
    ///
    /// Returns `None` once the signal driver has shut down.
    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        let Self {
            interrupt,
            terminate,
            hangup,
        } = self;

        let hangup = async {
            match hangup.as_mut() {
                Some(stream) => stream.recv().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            r = interrupt.recv() => r.map(|_| ShutdownSignal::Interrupt),
            r = terminate.recv() => r.map(|_| ShutdownSignal::Terminate),
            r = hangup => r.map(|_| ShutdownSignal::Hangup),
        }
    }
}

/// A live subscription to Ctrl-C, the only shutdown signal off Unix.
#[cfg(not(unix))]
pub struct SignalSubscription {
    _private: (),
}

#[cfg(not(unix))]
impl SignalSubscription {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self { _private: () })
    }

    pub fn watched(&self) -> Vec<ShutdownSignal> {
        vec![ShutdownSignal::Interrupt]
    }

    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        tokio::signal::ctrl_c()
            .await
            .ok()
            .map(|_| ShutdownSignal::Interrupt)
    }
}
