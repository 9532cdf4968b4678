//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor::spin (supervisor.rs):
//!     Subscribe signals → Spawn service → Spawn run-hooks → Race
//!
//! Race (race.rs):
//!     fatal.rs channel  ─┐
//!                        ├─ first ready wins → ShutdownOutcome
//!     signals.rs stream ─┘
//!
//! Outcome:
//!     ForceExit        → Service::close → return error
//!     GracefulShutdown → Service::shutdown(now + exit_wait_timeout) → return Ok
//!
//! Run-hooks (registration.rs):
//!     sleep(register_delay) → Registry::register → failure into fatal.rs
//! ```
//!
//! # Design Decisions
//! - Any fatal error, registration included, force-stops without a drain
//! - The drain deadline is the only timeout; close is not deadline-bounded
//! - The signal subscription is owned by the run, not installed globally

pub mod error;
pub mod fatal;
pub mod race;
pub mod registration;
pub mod service;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use error::LifecycleError;
pub use fatal::{fatal_channel, FatalReceiver, FatalSender};
pub use race::{race, wait_signal, RaceOutcome, ShutdownOutcome};
pub use registration::{registration_hook, RunHook};
pub use service::{Service, ServiceError};
pub use shutdown::Shutdown;
pub use signals::{classify, ShutdownSignal, SignalAction, SignalSubscription};
pub use supervisor::{LifecycleOptions, LifecycleState, SignalWaiter, Supervisor};
