//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::listener)
//!     → server.rs (Axum accept loop, graceful drain, hard close)
//!     → request.rs (assign / propagate x-request-id)
//!     → in-flight tracking (net::connection)
//!     → route handler
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{default_routes, HttpServer};
