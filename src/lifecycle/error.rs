//! Errors that end a supervisor run.

use thiserror::Error;

use crate::lifecycle::service::ServiceError;
use crate::lifecycle::signals::ShutdownSignal;
use crate::registry::RegistryError;

/// A process-ending condition surfaced to the caller of
/// [`Supervisor::spin`](crate::lifecycle::Supervisor::spin).
///
/// Every variant takes the force-stop path. A graceful signal is not an error
/// and never appears here.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The service loop returned an error.
    #[error("service failure: {0}")]
    ServiceFailure(#[source] ServiceError),

    /// The service loop returned cleanly before anyone asked it to stop.
    #[error("service stopped unexpectedly")]
    ServiceStopped,

    /// The service loop panicked.
    #[error("service panicked")]
    ServicePanicked,

    /// Announcing the instance to the registry failed.
    #[error("registration failure: {0}")]
    RegistrationFailure(#[source] RegistryError),

    /// A "terminate now" signal was delivered.
    #[error("{signal}")]
    ForceSignal { signal: ShutdownSignal },

    /// Installing the OS signal handlers failed.
    #[error("failed to subscribe to shutdown signals: {0}")]
    Subscribe(#[source] std::io::Error),
}
