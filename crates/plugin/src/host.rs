//! Host-facing collaborator interfaces

use config_loader::OptionMap;
use contracts::{ConfigSource, InstanceId};

/// Host side of plugin registration
pub trait PluginRegistrar {
    fn register_plugin(&mut self, name: &str, description: &str);
}

/// Per-instance context the host passes to `init` and `flush`
///
/// Carries the instance's configuration options and, after a successful
/// `init`, the identifier of the created instance.
pub trait HostContext: ConfigSource {
    fn set_instance_id(&mut self, id: InstanceId);

    fn instance_id(&self) -> Option<InstanceId>;
}

/// In-process host context backed by an option map
#[derive(Debug, Clone, Default)]
pub struct PluginContext {
    options: OptionMap,
    instance: Option<InstanceId>,
}

impl PluginContext {
    pub fn new(options: OptionMap) -> Self {
        Self {
            options,
            instance: None,
        }
    }

    pub fn options(&self) -> &OptionMap {
        &self.options
    }
}

impl ConfigSource for PluginContext {
    fn config_value(&self, key: &str) -> Option<String> {
        self.options.config_value(key)
    }
}

impl HostContext for PluginContext {
    fn set_instance_id(&mut self, id: InstanceId) {
        self.instance = Some(id);
    }

    fn instance_id(&self) -> Option<InstanceId> {
        self.instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_reads_options_and_stores_id() {
        let mut ctx = PluginContext::new(OptionMap::new().with("Stream", "s"));
        assert_eq!(ctx.config_value("stream").as_deref(), Some("s"));
        assert_eq!(ctx.instance_id(), None);

        ctx.set_instance_id(InstanceId(3));
        assert_eq!(ctx.instance_id(), Some(InstanceId(3)));
    }
}
