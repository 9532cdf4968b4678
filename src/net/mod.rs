//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured address
//!     → listener.rs (parse, bind, report local address)
//!     → Hand off to HTTP layer (axum accept loop)
//!     → connection.rs (in-flight request tracking for the drain)
//! ```
//!
//! # Design Decisions
//! - The socket is bound before the service is spawned, so it is reachable
//!   by the time the registry is told about it

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker};
pub use listener::{bind, ListenerError};
