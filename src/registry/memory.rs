//! In-process registry.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::registry::{Registry, RegistryError, RegistryInfo};

/// Keeps registered instances in memory, keyed by service name then address.
///
/// Useful when several services share a process, and as a registry double.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    services: DashMap<String, Vec<RegistryInfo>>,
    attempts: AtomicU64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instances registered under `service_name`.
    pub fn instances(&self, service_name: &str) -> Vec<RegistryInfo> {
        self.services
            .get(service_name)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Number of `register` calls, successful or not.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn register(&self, info: &RegistryInfo) -> Result<(), RegistryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if info.service_name.is_empty() {
            return Err(RegistryError::Invalid("empty service name".into()));
        }

        let mut instances = self.services.entry(info.service_name.clone()).or_default();
        let existing = instances.iter().position(|i| i.addr == info.addr);
        match existing {
            Some(pos) => instances[pos] = info.clone(),
            None => instances.push(info.clone()),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, addr: &str) -> RegistryInfo {
        RegistryInfo {
            service_name: name.into(),
            addr: addr.into(),
            ..RegistryInfo::default()
        }
    }

    #[tokio::test]
    async fn registers_and_lists_instances() {
        let registry = MemoryRegistry::new();
        registry.register(&info("api", "10.0.0.1:80")).await.unwrap();
        registry.register(&info("api", "10.0.0.2:80")).await.unwrap();

        assert_eq!(registry.instances("api").len(), 2);
        assert!(registry.instances("other").is_empty());
        assert_eq!(registry.attempts(), 2);
    }

    #[tokio::test]
    async fn re_registering_same_address_replaces() {
        let registry = MemoryRegistry::new();
        registry.register(&info("api", "10.0.0.1:80")).await.unwrap();

        let mut updated = info("api", "10.0.0.1:80");
        updated.weight = 50;
        registry.register(&updated).await.unwrap();

        let instances = registry.instances("api");
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].weight, 50);
    }

    #[tokio::test]
    async fn empty_service_name_is_rejected() {
        let registry = MemoryRegistry::new();
        let err = registry.register(&info("", "10.0.0.1:80")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Invalid(_)));
        assert_eq!(registry.attempts(), 1);
    }
}
