//! LogStreamClient - logs put requests via tracing instead of sending them

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{ContractError, OutputConfig, PutRecordsOutput, RequestEntry, StreamClient};
use tracing::{debug, info, instrument};

/// Stream client for local runs; every put succeeds
#[derive(Debug, Default)]
pub struct LogStreamClient {
    region: String,
    endpoint: Option<String>,
    puts: AtomicU64,
    records: AtomicU64,
}

impl LogStreamClient {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            ..Self::new(config.region.clone())
        }
    }

    /// Put requests handled so far
    pub fn puts(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Entries handled so far
    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }
}

impl StreamClient for LogStreamClient {
    #[instrument(
        name = "log_client_put_records",
        skip(self, entries),
        fields(region = %self.region, entries = entries.len())
    )]
    async fn put_records(
        &self,
        stream: &str,
        entries: &[RequestEntry],
    ) -> Result<PutRecordsOutput, ContractError> {
        for entry in entries {
            debug!(
                partition_key = %entry.partition_key,
                data = %String::from_utf8_lossy(&entry.data).trim_end(),
                "put entry"
            );
        }

        let bytes: usize = entries.iter().map(RequestEntry::size).sum();
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.records
            .fetch_add(entries.len() as u64, Ordering::Relaxed);
        info!(
            stream,
            endpoint = self.endpoint.as_deref().unwrap_or("default"),
            bytes,
            "PutRecords"
        );

        Ok(PutRecordsOutput::default())
    }
}
