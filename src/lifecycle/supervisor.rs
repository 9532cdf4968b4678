//! The lifecycle supervisor.
//!
//! # State machine
//! ```text
//! Starting ──► Running ──┬─ fatal error / SIGTERM ──► ForceStopped   (close, no drain)
//!                        ├─ SIGINT / SIGHUP ────────► Draining ──► Stopped
//!                        └─ nothing left to wait on ► Stopped        (clean return)
//! ```
//!
//! Starting subscribes to signals, spawns the service loop and the run-hooks,
//! and never blocks. Running blocks on the fatal-error / signal race. Draining
//! is bounded by `exit_wait_timeout`; a drain error is logged and the run still
//! ends in Stopped.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;

use crate::config::LifecycleConfig;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::fatal::{fatal_channel, FatalReceiver, FatalSender};
use crate::lifecycle::race::{wait_signal, ShutdownOutcome};
use crate::lifecycle::registration::{registration_hook, RunHook};
use crate::lifecycle::service::Service;
use crate::lifecycle::signals::SignalSubscription;
use crate::observability::metrics;
use crate::registry::{NoopRegistry, Registry, RegistryInfo};

/// Replacement for the default signal waiter.
///
/// Returning `Err` takes the force-stop path with that error; returning
/// `Ok(())` starts a graceful drain.
pub type SignalWaiter =
    Box<dyn FnOnce(FatalReceiver) -> BoxFuture<'static, Result<(), LifecycleError>> + Send>;

/// Where a supervisor run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Draining,
    Stopped,
    ForceStopped,
}

/// Immutable supervisor configuration.
#[derive(Clone)]
pub struct LifecycleOptions {
    /// Upper bound on the graceful drain.
    pub exit_wait_timeout: Duration,

    /// Directory the instance announces itself to.
    pub registry: Arc<dyn Registry>,

    /// Payload handed to the registry.
    pub registry_info: RegistryInfo,

    /// Wait between service start and registration.
    pub register_delay: Duration,

    /// Label attached to every log event.
    pub service_label: String,
}

impl LifecycleOptions {
    /// Options from the `[lifecycle]` config section, with a no-op registry.
    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self {
            exit_wait_timeout: Duration::from_secs(config.exit_wait_timeout_secs),
            register_delay: Duration::from_millis(config.register_delay_ms),
            service_label: config.service_label.clone(),
            ..Self::default()
        }
    }
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            exit_wait_timeout: Duration::from_secs(5),
            registry: Arc::new(NoopRegistry),
            registry_info: RegistryInfo::default(),
            register_delay: Duration::from_secs(1),
            service_label: "HTTP Server".to_string(),
        }
    }
}

/// Runs a [`Service`] until a fatal error or a shutdown signal.
pub struct Supervisor<S: Service> {
    service: Arc<S>,
    options: LifecycleOptions,
    hooks: Vec<RunHook>,
    signal_waiter: Option<SignalWaiter>,
    state: watch::Sender<LifecycleState>,
}

enum Waiter {
    Custom(SignalWaiter),
    Signals(SignalSubscription),
}

impl<S: Service> Supervisor<S> {
    pub fn new(service: Arc<S>, options: LifecycleOptions) -> Self {
        let (state, _) = watch::channel(LifecycleState::Starting);
        Self {
            service,
            options,
            hooks: Vec::new(),
            signal_waiter: None,
            state,
        }
    }

    /// Start `hook` alongside the service.
    ///
    /// Hooks can only be added before [`spin`](Self::spin) takes ownership of
    /// the supervisor. A hook reports failure through its [`FatalSender`].
    pub fn on_run<F, Fut>(&mut self, hook: F) -> &mut Self
    where
        F: FnOnce(FatalSender) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.push(Box::new(move |fatal| hook(fatal).boxed()));
        self
    }

    /// Replace the default SIGINT/SIGHUP/SIGTERM handling.
    ///
    /// `waiter` gets the fatal-error receiver and must return `Err` to force a
    /// stop or `Ok(())` to drain.
    pub fn set_signal_waiter<F, Fut>(&mut self, waiter: F) -> &mut Self
    where
        F: FnOnce(FatalReceiver) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), LifecycleError>> + Send + 'static,
    {
        self.signal_waiter = Some(Box::new(move |fatal| waiter(fatal).boxed()));
        self
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Run the service until it must stop.
    ///
    /// Returns the error that forced the stop, or `Ok(())` after a graceful
    /// drain. Exiting the process is left to the caller.
    pub async fn spin(self) -> Result<(), LifecycleError> {
        let Self {
            service,
            options,
            mut hooks,
            signal_waiter,
            state,
        } = self;
        let label = options.service_label.clone();

        hooks.push(registration_hook(
            Arc::clone(&options.registry),
            options.registry_info.clone(),
            options.register_delay,
            label.clone(),
        ));

        let waiter = match signal_waiter {
            Some(custom) => Waiter::Custom(custom),
            None => match SignalSubscription::new() {
                Ok(subscription) => Waiter::Signals(subscription),
                Err(e) => {
                    tracing::error!(service = %label, error = %e, "Failed to subscribe to signals");
                    state.send_replace(LifecycleState::ForceStopped);
                    return Err(LifecycleError::Subscribe(e));
                }
            },
        };

        let (fatal_tx, fatal_rx) = fatal_channel();
        let service_task = spawn_service(Arc::clone(&service), fatal_tx.clone(), label.clone());
        let mut hook_tasks = JoinSet::new();
        for hook in hooks {
            hook_tasks.spawn(hook(fatal_tx.clone()));
        }
        drop(fatal_tx);

        state.send_replace(LifecycleState::Running);
        tracing::debug!(service = %label, "Supervisor running");

        let outcome = match waiter {
            Waiter::Custom(custom) => ShutdownOutcome::from(custom(fatal_rx).await),
            Waiter::Signals(subscription) => wait_signal(fatal_rx, subscription).await,
        };

        // A registration still sleeping must not announce a stopping instance.
        hook_tasks.abort_all();
        metrics::record_shutdown(outcome.as_label());

        let result = match outcome {
            ShutdownOutcome::ForceExit(err) => {
                tracing::error!(service = %label, error = %err, "Receive close signal");
                if let Err(e) = service.close().await {
                    tracing::error!(service = %label, error = %e, "Close error");
                }
                state.send_replace(LifecycleState::ForceStopped);
                Err(err)
            }
            ShutdownOutcome::GracefulShutdown => {
                state.send_replace(LifecycleState::Draining);
                drain(service.as_ref(), options.exit_wait_timeout, &label).await;
                state.send_replace(LifecycleState::Stopped);
                Ok(())
            }
            ShutdownOutcome::NoAction => {
                tracing::warn!(service = %label, "No shutdown source left, stopping");
                state.send_replace(LifecycleState::Stopped);
                Ok(())
            }
        };

        service_task.abort();
        result
    }
}

/// Spawn the service loop; whatever ends it is reported as fatal.
fn spawn_service<S: Service>(service: Arc<S>, fatal: FatalSender, label: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        let err = match AssertUnwindSafe(service.run()).catch_unwind().await {
            Ok(Ok(())) => LifecycleError::ServiceStopped,
            Ok(Err(e)) => LifecycleError::ServiceFailure(e),
            Err(_) => LifecycleError::ServicePanicked,
        };
        tracing::debug!(service = %label, exit = %err, "Service loop exited");
        fatal.report(err);
    })
}

async fn drain<S: Service>(service: &S, timeout: Duration, label: &str) {
    tracing::info!(
        service = %label,
        timeout_secs = timeout.as_secs_f64(),
        "Begin graceful shutdown"
    );

    let deadline = drain_deadline(Instant::now(), timeout);
    match tokio::time::timeout_at(deadline, service.shutdown(deadline)).await {
        Ok(Ok(())) => tracing::info!(service = %label, "Graceful shutdown complete"),
        Ok(Err(e)) => tracing::error!(service = %label, error = %e, "Shutdown error"),
        Err(_) => tracing::error!(service = %label, "Shutdown did not finish before the deadline"),
    }
}

/// `now + timeout`, saturating at a deadline far enough to never be reached.
fn drain_deadline(now: Instant, timeout: Duration) -> Instant {
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
}

/// Roughly thirty years.
const FAR_FUTURE_SECS: u64 = 86400 * 365 * 30;
