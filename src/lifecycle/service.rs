//! The contract a supervised service fulfils.

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

/// Error type for service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The accept loop or a socket operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `run` was called after the listener was consumed by an earlier run
    /// or released by `shutdown`/`close`.
    #[error("service was already started or stopped")]
    AlreadyStarted,

    /// The drain did not finish before its deadline.
    #[error("drain deadline exceeded with {in_flight} request(s) in flight")]
    DeadlineExceeded { in_flight: u64 },

    /// Any other failure reported by an implementation.
    #[error("{0}")]
    Other(String),
}

/// A long-running network service driven by the supervisor.
///
/// `run` is spawned on its own task; `shutdown` and `close` are called from the
/// supervisor while `run` is still in progress, so implementations hold their
/// stop triggers behind `&self`.
///
/// Run-hooks, registration included, start as soon as `run` is spawned; the
/// registration delay is counted from then, not from the first accept. An
/// implementation must therefore be reachable before `run` is first polled,
/// typically by binding its listener when it is constructed.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Serve until failure or until `shutdown`/`close` stops the loop.
    async fn run(&self) -> Result<(), ServiceError>;

    /// Stop accepting new work immediately and wait for in-flight work to
    /// finish or for `deadline` to pass, whichever comes first.
    async fn shutdown(&self, deadline: Instant) -> Result<(), ServiceError>;

    /// Stop the accept path unconditionally, without draining.
    async fn close(&self) -> Result<(), ServiceError>;
}
