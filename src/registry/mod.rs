//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor starts service
//!     → registration hook sleeps register_delay
//!     → Registry::register(RegistryInfo)
//!         ├─ NoopRegistry   (nothing to announce)
//!         ├─ MemoryRegistry (in-process directory)
//!         └─ HttpRegistry   (POST JSON to a directory service)
//!     → failure reported on the fatal-error channel
//! ```
//!
//! # Design Decisions
//! - Registration is single-attempt; there is no retry
//! - The payload is opaque to the supervisor; only registries interpret it

pub mod http;
pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpRegistry;
pub use memory::MemoryRegistry;

/// Describes this instance to a registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryInfo {
    /// Logical service name instances are grouped under.
    pub service_name: String,

    /// Address clients should connect to.
    pub addr: String,

    /// Relative weight for client-side load balancing.
    pub weight: u32,

    /// Free-form metadata.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Default for RegistryInfo {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            addr: String::new(),
            weight: 10,
            tags: BTreeMap::new(),
        }
    }
}

/// Error type for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The directory service answered with a non-success status.
    #[error("registry rejected registration with status {status}")]
    Rejected { status: u16 },

    /// The request never got an answer.
    #[error("registry transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The payload is not acceptable to this registry.
    #[error("invalid registration: {0}")]
    Invalid(String),

    #[error("{0}")]
    Other(String),
}

/// An external directory the process announces itself to.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Announce `info`. Called at most once per process.
    async fn register(&self, info: &RegistryInfo) -> Result<(), RegistryError>;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}

/// A registry that accepts everything and announces nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistry;

#[async_trait]
impl Registry for NoopRegistry {
    async fn register(&self, _info: &RegistryInfo) -> Result<(), RegistryError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
