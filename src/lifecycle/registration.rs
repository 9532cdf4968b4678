//! Background registration: announce the instance once the service is up.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::fatal::FatalSender;
use crate::observability::metrics;
use crate::registry::{Registry, RegistryInfo};

/// A task started alongside the service.
///
/// The hook receives its own [`FatalSender`]; it has no other way to report a
/// failure. The supervisor aborts hooks that are still pending when it stops.
pub type RunHook = Box<dyn FnOnce(FatalSender) -> BoxFuture<'static, ()> + Send>;

/// Build the run-hook that registers `info` after `delay`.
///
/// The delay gives the listener time to become reachable before it is
/// advertised. A failed registration is escalated to a fatal error.
pub fn registration_hook(
    registry: Arc<dyn Registry>,
    info: RegistryInfo,
    delay: Duration,
    service: String,
) -> RunHook {
    Box::new(move |fatal: FatalSender| {
        async move {
            tokio::time::sleep(delay).await;

            match registry.register(&info).await {
                Ok(()) => {
                    metrics::record_registration(true);
                    tracing::info!(
                        service = %service,
                        registry = registry.name(),
                        service_name = %info.service_name,
                        addr = %info.addr,
                        "Registered with service registry"
                    );
                }
                Err(e) => {
                    metrics::record_registration(false);
                    tracing::error!(
                        service = %service,
                        registry = registry.name(),
                        error = %e,
                        "Register error"
                    );
                    fatal.report(LifecycleError::RegistrationFailure(e));
                }
            }
        }
        .boxed()
    })
}
