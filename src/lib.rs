//! Frame Server Library
//!
//! Runs a network service under a lifecycle supervisor that races fatal
//! errors against OS shutdown signals and drains gracefully under a deadline.

pub mod config;
pub mod csrf;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::{LifecycleError, LifecycleOptions, Service, Supervisor};
pub use registry::{Registry, RegistryInfo};
