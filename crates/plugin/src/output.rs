//! OutputPlugin - register / init / flush / exit

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{
    ContractError, DeliveryAdapter, FlushOutcome, FlushReport, InstanceId, OutputConfig,
};
use dispatcher::{DispatcherConfig, FlushDispatcher};
use normalizer::normalize_msgpack;
use observability::ObservabilityConfig;
use registry::InstanceRegistry;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::host::{HostContext, PluginRegistrar};

/// Name announced to the host
pub const PLUGIN_NAME: &str = "kinesis";

/// Description announced to the host
pub const PLUGIN_DESCRIPTION: &str = "Amazon Kinesis Data Streams Fluent Bit Plugin.";

/// Output plugin bound to one adapter factory
///
/// Owns the instance registry and the flush dispatcher. `build_adapter`
/// turns each validated configuration into the instance's delivery adapter.
pub struct OutputPlugin<A, F> {
    registry: Arc<InstanceRegistry<A>>,
    dispatcher: FlushDispatcher<A>,
    build_adapter: F,
    registered: AtomicBool,
}

impl<A, F> OutputPlugin<A, F>
where
    A: DeliveryAdapter + Send + Sync + 'static,
    F: Fn(&OutputConfig, InstanceId) -> Result<A, ContractError>,
{
    /// Create a plugin whose flush tasks run on `runtime`
    pub fn new(build_adapter: F, config: DispatcherConfig, runtime: Handle) -> Self {
        let registry = Arc::new(InstanceRegistry::new());
        let dispatcher = FlushDispatcher::new(Arc::clone(&registry), config, runtime);
        Self {
            registry,
            dispatcher,
            build_adapter,
            registered: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry<A>> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &FlushDispatcher<A> {
        &self.dispatcher
    }

    /// Announce the plugin to the host (first call only)
    pub fn register<R: PluginRegistrar + ?Sized>(&self, host: &mut R) -> FlushOutcome {
        if self.registered.swap(true, Ordering::SeqCst) {
            debug!(plugin = PLUGIN_NAME, "plugin already registered");
            return FlushOutcome::Ok;
        }
        host.register_plugin(PLUGIN_NAME, PLUGIN_DESCRIPTION);
        FlushOutcome::Ok
    }

    /// Create an instance from the context's options
    ///
    /// Logging is set up on the first call (level from `FLB_LOG_LEVEL`).
    #[instrument(name = "plugin_init", skip_all)]
    pub fn init<C: HostContext + ?Sized>(&self, ctx: &mut C) -> FlushOutcome {
        if let Err(e) = observability::init_once(ObservabilityConfig::from_env()) {
            warn!(error = %e, "metrics exporter not started");
        }
        info!(plugin = PLUGIN_NAME, "initializing output plugin");

        match self.registry.create(&*ctx, &self.build_adapter) {
            Ok(id) => {
                ctx.set_instance_id(id);
                FlushOutcome::Ok
            }
            Err(e) => {
                error!(error = %e, "failed to initialize plugin instance");
                FlushOutcome::Error
            }
        }
    }

    /// Normalize `data` and spawn its delivery; returns without waiting
    ///
    /// `OK` means the flush was handed off, not that it was delivered.
    pub fn flush<C: HostContext + ?Sized>(&self, ctx: &C, data: &[u8], tag: &str) -> FlushOutcome {
        match self.flush_tracked(ctx, data, tag) {
            Ok(_) => FlushOutcome::Ok,
            Err(e) => {
                error!(tag, error = %e, "flush rejected");
                FlushOutcome::Error
            }
        }
    }

    /// Like `flush`, but hands back the task for callers that await it
    ///
    /// # Errors
    /// `MissingInstance` when the context was never initialized
    #[instrument(name = "plugin_flush", skip(self, ctx, data), fields(bytes = data.len()))]
    pub fn flush_tracked<C: HostContext + ?Sized>(
        &self,
        ctx: &C,
        data: &[u8],
        tag: &str,
    ) -> Result<JoinHandle<FlushReport>, ContractError> {
        let id = ctx.instance_id().ok_or(ContractError::MissingInstance)?;
        let batch = normalize_msgpack(data);
        debug!(instance = %id, records = batch.count(), "dispatching flush");
        Ok(self.dispatcher.dispatch(id, tag, batch))
    }

    /// Shut down; in-flight flushes are not awaited
    pub fn exit(&self) -> FlushOutcome {
        let in_flight = self.dispatcher.in_flight();
        if in_flight > 0 {
            warn!(in_flight, "exiting with flush tasks still running");
        } else {
            info!(plugin = PLUGIN_NAME, "exiting");
        }
        FlushOutcome::Ok
    }
}
