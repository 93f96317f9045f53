//! StreamAdapter - converts records into put-request entries

use std::borrow::Cow;
use std::fmt::Write;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use tracing::{debug, error, instrument, warn};

use contracts::{
    ContractError, DeliveryAdapter, FlushOutcome, InstanceId, LogValue, OutputConfig, Record,
    RequestBuffer, RequestEntry, StreamClient, MAX_PUT_PAYLOAD_SIZE, MAX_RECORDS_PER_PUT,
    MAX_RECORD_SIZE,
};

/// Length of generated partition keys
pub const RANDOM_PARTITION_KEY_LENGTH: usize = 8;

/// Longest partition key the service accepts (characters)
pub const MAX_PARTITION_KEY_LENGTH: usize = 256;

/// Separator of nested partition key fields (`kubernetes->pod_name`)
pub const NESTED_KEY_SEPARATOR: &str = "->";

/// Delivery adapter for one configured stream
pub struct StreamAdapter<C> {
    name: String,
    stream: String,
    data_keys: Vec<String>,
    partition_key_path: Option<Vec<String>>,
    append_newline: bool,
    time_key: Option<String>,
    time_key_format: String,
    client: C,
}

impl<C> StreamAdapter<C> {
    /// Build the adapter of instance `id` from its validated configuration
    pub fn from_config(config: &OutputConfig, id: InstanceId, client: C) -> Self {
        let partition_key_path = config.partition_key.as_ref().map(|field| {
            field
                .split(NESTED_KEY_SEPARATOR)
                .map(str::to_string)
                .collect()
        });

        Self {
            name: format!("kinesis.{id}"),
            stream: config.stream.clone(),
            data_keys: config.data_keys.clone(),
            partition_key_path,
            append_newline: config.append_newline,
            time_key: config.time_key.clone(),
            time_key_format: config.time_key_format.clone(),
            client,
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Partition key from the configured field, or a random one
    fn partition_key(&self, record: &Record) -> String {
        if let Some(path) = &self.partition_key_path {
            let segments: Vec<&str> = path.iter().map(String::as_str).collect();
            match record
                .lookup_path(&segments)
                .and_then(LogValue::to_scalar_string)
            {
                Some(key) if !key.is_empty() => return truncate_key(key),
                _ => debug!(
                    field = %path.join(NESTED_KEY_SEPARATOR),
                    "partition key field missing, using random key"
                ),
            }
        }
        random_partition_key()
    }

    /// Serialized payload: data keys, time key, optional newline
    fn encode(&self, record: &Record, timestamp: DateTime<Utc>) -> Result<Bytes, ContractError> {
        let mut record = Cow::Borrowed(record);
        if !self.data_keys.is_empty() {
            record = Cow::Owned(record.retain_keys(&self.data_keys));
        }
        if let Some(key) = &self.time_key {
            let mut formatted = String::new();
            write!(formatted, "{}", timestamp.format(&self.time_key_format)).map_err(|_| {
                ContractError::encode(format!(
                    "cannot format timestamp with '{}'",
                    self.time_key_format
                ))
            })?;
            record.to_mut().insert(key.as_str(), LogValue::Str(formatted));
        }

        let mut data = record.to_json()?;
        if self.append_newline {
            data.push(b'\n');
        }
        Ok(Bytes::from(data))
    }
}

impl<C: StreamClient + Sync> StreamAdapter<C> {
    /// Put the buffered entries; the buffer is cleared only on full success
    #[instrument(
        name = "stream_put_records",
        skip(self, buffer),
        fields(stream = %self.stream, entries = buffer.len())
    )]
    async fn send(&self, buffer: &mut RequestBuffer) -> FlushOutcome {
        match self.client.put_records(&self.stream, buffer.entries()).await {
            Ok(output) if output.failed_record_count == 0 => {
                debug!(
                    entries = buffer.len(),
                    bytes = buffer.payload_size(),
                    "records sent"
                );
                buffer.clear();
                FlushOutcome::Ok
            }
            Ok(output) => {
                warn!(
                    failed = output.failed_record_count,
                    entries = buffer.len(),
                    "service rejected records"
                );
                FlushOutcome::Retry
            }
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "put failed, will retry");
                FlushOutcome::Retry
            }
            Err(e) => {
                error!(error = %e, "put failed");
                FlushOutcome::Error
            }
        }
    }
}

impl<C: StreamClient + Sync> DeliveryAdapter for StreamAdapter<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add_record(
        &self,
        buffer: &mut RequestBuffer,
        record: &Record,
        timestamp: DateTime<Utc>,
    ) -> FlushOutcome {
        let partition_key = self.partition_key(record);
        let data = match self.encode(record, timestamp) {
            Ok(data) => data,
            Err(e) => {
                error!(adapter = %self.name, error = %e, "record could not be encoded");
                return FlushOutcome::Error;
            }
        };

        let entry = RequestEntry {
            data,
            partition_key,
        };
        let size = entry.size();
        if size > MAX_RECORD_SIZE {
            warn!(
                adapter = %self.name,
                size,
                limit = MAX_RECORD_SIZE,
                "record exceeds maximum size, dropping"
            );
            return FlushOutcome::Ok;
        }

        if buffer.len() >= MAX_RECORDS_PER_PUT
            || buffer.payload_size() + size > MAX_PUT_PAYLOAD_SIZE
        {
            let outcome = self.send(buffer).await;
            if outcome != FlushOutcome::Ok {
                return outcome;
            }
        }

        buffer.push(entry);
        FlushOutcome::Ok
    }

    async fn flush(&self, buffer: &mut RequestBuffer) -> FlushOutcome {
        if buffer.is_empty() {
            return FlushOutcome::Ok;
        }
        self.send(buffer).await
    }
}

fn truncate_key(key: String) -> String {
    match key.char_indices().nth(MAX_PARTITION_KEY_LENGTH) {
        Some((end, _)) => key[..end].to_string(),
        None => key,
    }
}

fn random_partition_key() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(RANDOM_PARTITION_KEY_LENGTH)
        .map(char::from)
        .collect()
}
