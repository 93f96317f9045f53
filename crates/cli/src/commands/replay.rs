//! `replay` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ContractError, FlushOutcome, InstanceId, OutputConfig};
use dispatcher::{DispatcherConfig, LogStreamClient, StreamAdapter};
use observability::FlushStatsAggregator;
use plugin::{OutputPlugin, PluginContext, PluginRegistrar};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::cli::ReplayArgs;

/// Registrar that only logs the announcement
struct LogRegistrar;

impl PluginRegistrar for LogRegistrar {
    fn register_plugin(&mut self, name: &str, description: &str) {
        info!(plugin = name, description, "plugin registered");
    }
}

fn log_stream_adapter(
    config: &OutputConfig,
    id: InstanceId,
) -> Result<StreamAdapter<LogStreamClient>, ContractError> {
    let client = LogStreamClient::from_config(config);
    Ok(StreamAdapter::from_config(config, id, client))
}

/// Execute the `replay` command
pub async fn run_replay(args: &ReplayArgs) -> Result<()> {
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let options = ConfigLoader::load_options_from_path(&args.config)
        .with_context(|| format!("Failed to load options from {}", args.config.display()))?;

    let config = DispatcherConfig {
        max_attempts: args.attempts,
        task_timeout: Duration::from_secs(args.timeout),
    };
    let plugin = OutputPlugin::new(log_stream_adapter, config, Handle::current());
    plugin.register(&mut LogRegistrar);

    let mut ctx = PluginContext::new(options);
    if plugin.init(&mut ctx) != FlushOutcome::Ok {
        anyhow::bail!(
            "Failed to initialize output from {}",
            args.config.display()
        );
    }

    let mut handles = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let data = tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read batch {}", input.display()))?;
        info!(input = %input.display(), bytes = data.len(), "Replaying batch");
        handles.push(plugin.flush_tracked(&ctx, &data, &args.tag)?);
    }

    let mut stats = FlushStatsAggregator::new();
    for handle in handles {
        let report = handle.await.context("Flush task panicked")?;
        stats.update(&report);
    }
    plugin.exit();

    let summary = stats.summary();
    println!("{}", summary);

    let undelivered = summary.total_flushes - summary.delivered;
    if undelivered > 0 {
        warn!(undelivered, "Some flushes were not delivered");
        anyhow::bail!("{} of {} flushes not delivered", undelivered, summary.total_flushes);
    }

    Ok(())
}
