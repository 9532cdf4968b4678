//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Supervisor timings.
    pub lifecycle: LifecycleConfig,

    /// Service registry announcement.
    pub registry: RegistryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8888").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8888".to_string(),
        }
    }
}

/// Supervisor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Upper bound on the graceful drain, in seconds.
    pub exit_wait_timeout_secs: u64,

    /// Delay between service start and registry announcement, in milliseconds.
    pub register_delay_ms: u64,

    /// Label attached to lifecycle log events.
    pub service_label: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            exit_wait_timeout_secs: 5,
            register_delay_ms: 1000,
            service_label: "HTTP Server".to_string(),
        }
    }
}

/// Which registry implementation to announce to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// Do not announce.
    #[default]
    None,
    /// In-process registry.
    Memory,
    /// POST to `endpoint`.
    Http,
}

/// Registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub kind: RegistryKind,

    /// Directory endpoint, required for `http`.
    pub endpoint: Option<String>,

    /// Name to register under.
    pub service_name: String,

    /// Address to advertise; defaults to the bound listener address.
    pub advertise_address: Option<String>,

    /// Load-balancing weight.
    pub weight: u32,

    /// Request timeout for the registry call, in seconds.
    pub timeout_secs: u64,

    /// Extra metadata sent with the registration.
    pub tags: BTreeMap<String, String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            kind: RegistryKind::None,
            endpoint: None,
            service_name: "frame-server".to_string(),
            advertise_address: None,
            weight: 10,
            timeout_secs: 5,
            tags: BTreeMap::new(),
        }
    }
}

/// Timeout configuration for request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus scrape address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "frame_server=info,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
