//! PluginInstance - one configured output

use contracts::{InstanceId, OutputConfig};

/// A configured output plugin instance
///
/// Immutable after construction and shared by every flush task of the
/// instance.
#[derive(Debug)]
pub struct PluginInstance<A> {
    /// Registry position, used for log correlation
    pub id: InstanceId,
    pub config: OutputConfig,
    /// Delivery adapter built from `config`
    pub adapter: A,
}

impl<A> PluginInstance<A> {
    pub fn new(id: InstanceId, config: OutputConfig, adapter: A) -> Self {
        Self {
            id,
            config,
            adapter,
        }
    }

    /// Target stream of this instance
    pub fn stream(&self) -> &str {
        &self.config.stream
    }
}
