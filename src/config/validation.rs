//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that the chosen registry has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{RegistryKind, ServerConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("lifecycle.exit_wait_timeout_secs must be greater than 0")]
    ExitWaitTimeout,

    #[error("lifecycle.exit_wait_timeout_secs must be at most {max}, got {got}")]
    ExitWaitTimeoutTooLarge { got: u64, max: u64 },

    #[error("timeouts.request_secs must be greater than 0")]
    RequestTimeout,

    #[error("registry.endpoint is required for the http registry")]
    MissingRegistryEndpoint,

    #[error("invalid registry endpoint '{0}'")]
    RegistryEndpoint(String),

    #[error("registry.service_name must not be empty")]
    EmptyServiceName,

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Longest accepted graceful drain, one day.
pub const MAX_EXIT_WAIT_TIMEOUT_SECS: u64 = 86_400;

/// Check a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    match config.lifecycle.exit_wait_timeout_secs {
        0 => errors.push(ValidationError::ExitWaitTimeout),
        got if got > MAX_EXIT_WAIT_TIMEOUT_SECS => {
            errors.push(ValidationError::ExitWaitTimeoutTooLarge {
                got,
                max: MAX_EXIT_WAIT_TIMEOUT_SECS,
            })
        }
        _ => {}
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    let registry = &config.registry;
    if registry.kind != RegistryKind::None && registry.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    if registry.kind == RegistryKind::Http {
        match &registry.endpoint {
            None => errors.push(ValidationError::MissingRegistryEndpoint),
            Some(endpoint) => {
                if Url::parse(endpoint).is_err() {
                    errors.push(ValidationError::RegistryEndpoint(endpoint.clone()));
                }
            }
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
