//! # Observability
//!
//! Tracing and Prometheus metrics for the Kinesis output plugin.
//!
//! ## Features
//!
//! - Tracing initialization (JSON/Pretty/Compact)
//! - Prometheus metrics export
//! - Normalization and flush outcome counters
//!
//! ## Usage
//!
//! ```ignore
//! use observability::{init_once, metrics, ObservabilityConfig};
//!
//! init_once(ObservabilityConfig::from_env())?;
//!
//! let report = handle.await?;
//! metrics::record_flush_completed(&report);
//! ```

pub mod metrics;

use std::sync::OnceLock;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use crate::metrics::{
    record_batch_normalized, record_flush_attempt, record_flush_completed, FlushStatsAggregator,
    MetricsSummary, RunningStats, StatsSummary,
};

/// Host variable selecting the plugin's log level
pub const LOG_LEVEL_ENV: &str = "FLB_LOG_LEVEL";

/// Variable enabling the Prometheus endpoint when loaded by a host
pub const METRICS_PORT_ENV: &str = "KINESIS_OUTPUT_METRICS_PORT";

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Configuration for a plugin loaded into a host process
    ///
    /// The log level comes from `FLB_LOG_LEVEL` (default `info`). Metrics
    /// stay off unless `KINESIS_OUTPUT_METRICS_PORT` names a port.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_log_level = lookup(LOG_LEVEL_ENV)
            .map(|level| level.trim().to_ascii_lowercase())
            .filter(|level| !level.is_empty())
            .unwrap_or_else(|| "info".to_string());
        let metrics_port = lookup(METRICS_PORT_ENV).and_then(|port| port.trim().parse().ok());

        Self {
            log_format: LogFormat::Compact,
            metrics_port,
            default_log_level,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// Structured JSON
    #[default]
    Json,
    /// Human-readable
    Pretty,
    /// Single line
    Compact,
}

/// Initialize with a custom configuration
///
/// A subscriber already installed by the process is kept. The Prometheus
/// exporter is installed either way.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let installed = match config.log_format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().pretty();

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer().compact().with_target(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
    };
    if let Err(e) = installed {
        tracing::debug!(error = %e, "tracing subscriber already installed, keeping it");
    }

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        level = %config.default_log_level,
        "Observability initialized"
    );

    Ok(())
}

/// Initialize at most once per process
///
/// Every plugin instance calls this from its init callback; only the first
/// call does any work. Returns `Ok(false)` when already initialized.
pub fn init_once(config: ObservabilityConfig) -> Result<bool> {
    let mut result = Ok(false);
    INITIALIZED.get_or_init(|| {
        result = init_with_config(config).map(|()| true);
    });
    result
}

/// Initialize only the Prometheus exporter
///
/// For processes where tracing is already set up elsewhere.
pub fn init_metrics_only(port: u16) -> Result<()> {
    let builder = PrometheusBuilder::new();
    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
