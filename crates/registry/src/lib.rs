//! # Registry
//!
//! Instance registry for configured output plugin instances.
//!
//! Responsibilities:
//! - Validate configuration and build one instance per host `init`
//! - Issue identifiers equal to the instance's position
//! - Hand out shared, immutable instances to concurrent flush tasks
//!
//! ## Synchronization
//!
//! The instance list sits behind a read-write lock. Creation holds the
//! write lock for the whole validate-build-append step, so identifiers are
//! never interleaved; flush tasks only ever take the read lock.

mod instance;

pub use instance::PluginInstance;

use std::sync::{Arc, PoisonError, RwLock};

use config_loader::ConfigLoader;
use contracts::{ConfigSource, ContractError, InstanceId, OutputConfig};
use tracing::{error, info, instrument};

/// Append-only registry of plugin instances
pub struct InstanceRegistry<A> {
    instances: RwLock<Vec<Arc<PluginInstance<A>>>>,
}

impl<A> InstanceRegistry<A> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(Vec::new()),
        }
    }

    /// Validate configuration, build the adapter and append a new instance
    ///
    /// # Errors
    /// Configuration or adapter construction failure; nothing is appended and
    /// no identifier is consumed.
    #[instrument(name = "registry_create", skip_all)]
    pub fn create<S, F>(&self, source: &S, build_adapter: F) -> Result<InstanceId, ContractError>
    where
        S: ConfigSource + ?Sized,
        F: FnOnce(&OutputConfig, InstanceId) -> Result<A, ContractError>,
    {
        // Appends are append-only, a poisoned lock still holds a consistent list
        let mut instances = self
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let id = InstanceId(instances.len());
        let config = ConfigLoader::from_source(source, id).inspect_err(|e| {
            error!(instance = %id, error = %e, "invalid configuration");
        })?;
        let adapter = build_adapter(&config, id)?;

        instances.push(Arc::new(PluginInstance::new(id, config, adapter)));
        info!(instance = %id, "plugin instance created");
        Ok(id)
    }

    /// Look up an instance by identifier
    ///
    /// # Errors
    /// `UnknownInstance` if the identifier was never issued
    pub fn get(&self, id: InstanceId) -> Result<Arc<PluginInstance<A>>, ContractError> {
        let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);
        instances
            .get(id.index())
            .cloned()
            .ok_or(ContractError::UnknownInstance {
                id,
                len: instances.len(),
            })
    }

    /// Number of instances created so far
    pub fn len(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A> Default for InstanceRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::OptionMap;

    fn options(stream: &str, region: &str, partition_key: &str) -> OptionMap {
        OptionMap::new()
            .with("stream", stream)
            .with("region", region)
            .with("partition_key", partition_key)
    }

    fn stream_name(config: &OutputConfig, _id: InstanceId) -> Result<String, ContractError> {
        Ok(config.stream.clone())
    }

    #[test]
    fn test_ids_are_sequential_from_zero() {
        let registry = InstanceRegistry::new();
        for expected in 0..4 {
            let id = registry
                .create(&options(&format!("s{expected}"), "us-east-1", ""), stream_name)
                .unwrap();
            assert_eq!(id, InstanceId(expected));
        }
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get(InstanceId(2)).unwrap().adapter, "s2");
        assert_eq!(registry.get(InstanceId(2)).unwrap().id, InstanceId(2));
    }

    #[test]
    fn test_failed_create_appends_nothing() {
        let registry = InstanceRegistry::new();
        registry
            .create(&options("s", "us-east-1", ""), stream_name)
            .unwrap();

        assert!(registry.create(&options("", "us-east-1", ""), stream_name).is_err());
        assert!(registry.create(&options("s", "", ""), stream_name).is_err());
        assert!(registry.create(&options("s", "us-east-1", "log"), stream_name).is_err());
        assert_eq!(registry.len(), 1);

        // No identifier was consumed by the failures
        let id = registry
            .create(&options("t", "us-east-1", ""), stream_name)
            .unwrap();
        assert_eq!(id, InstanceId(1));
    }

    #[test]
    fn test_adapter_failure_appends_nothing() {
        let registry: InstanceRegistry<String> = InstanceRegistry::new();
        let result = registry.create(&options("s", "us-east-1", ""), |_, _| {
            Err(ContractError::config_validation("endpoint", "unreachable"))
        });
        assert!(result.is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_instance() {
        let registry: InstanceRegistry<String> = InstanceRegistry::new();
        let err = registry.get(InstanceId(5)).unwrap_err();
        assert!(matches!(
            err,
            ContractError::UnknownInstance { id: InstanceId(5), len: 0 }
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads() {
        let registry = Arc::new(InstanceRegistry::new());
        for i in 0..3 {
            registry
                .create(&options(&format!("s{i}"), "us-east-1", ""), stream_name)
                .unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let id = InstanceId(i % 3);
                registry.get(id).unwrap().adapter.clone()
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), format!("s{}", i % 3));
        }
    }
}
