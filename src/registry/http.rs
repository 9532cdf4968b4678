//! Registry reached over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::registry::{Registry, RegistryError, RegistryInfo};

/// POSTs the JSON-encoded [`RegistryInfo`] to a directory endpoint.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpRegistry {
    /// Create a registry client for `endpoint` with a per-request timeout.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn register(&self, info: &RegistryInfo) -> Result<(), RegistryError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            service_name = %info.service_name,
            addr = %info.addr,
            "Sending registration"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(info)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
