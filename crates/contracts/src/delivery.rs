//! Delivery traits - Dispatcher output interface
//!
//! `DeliveryAdapter` turns normalized records into request entries;
//! `StreamClient` performs the network round trip for a batch of entries.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::{ContractError, FlushOutcome, Record};

/// Maximum entries per put request
pub const MAX_RECORDS_PER_PUT: usize = 500;

/// Maximum size of one entry (data + partition key)
pub const MAX_RECORD_SIZE: usize = 1024 * 1024;

/// Maximum total payload of one put request
pub const MAX_PUT_PAYLOAD_SIZE: usize = 5 * 1024 * 1024;

/// One entry of a put request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEntry {
    pub data: Bytes,
    pub partition_key: String,
}

impl RequestEntry {
    /// Bytes counted against the request limits
    pub fn size(&self) -> usize {
        self.data.len() + self.partition_key.len()
    }
}

/// Per-flush accumulation of request entries
///
/// Every flush task owns its own buffer; buffers are never shared.
#[derive(Debug, Default)]
pub struct RequestBuffer {
    entries: Vec<RequestEntry>,
    payload_size: usize,
}

impl RequestBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            payload_size: 0,
        }
    }

    pub fn push(&mut self, entry: RequestEntry) {
        self.payload_size += entry.size();
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RequestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes of all entries
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.payload_size = 0;
    }
}

/// Result of a put request the service accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutRecordsOutput {
    /// Entries the service rejected individually
    pub failed_record_count: usize,
}

/// Record delivery trait
///
/// Implementations are shared by every concurrent flush of an instance and
/// must keep per-flush state in the supplied buffer only.
#[trait_variant::make(DeliveryAdapter: Send)]
pub trait LocalDeliveryAdapter {
    /// Adapter name (used for logging)
    fn name(&self) -> &str;

    /// Convert one record into a request entry
    ///
    /// A non-`Ok` outcome aborts the current attempt.
    async fn add_record(
        &self,
        buffer: &mut RequestBuffer,
        record: &Record,
        timestamp: DateTime<Utc>,
    ) -> FlushOutcome;

    /// Send whatever the buffer still holds
    async fn flush(&self, buffer: &mut RequestBuffer) -> FlushOutcome;
}

/// Network client of the streaming-ingestion service
#[trait_variant::make(StreamClient: Send)]
pub trait LocalStreamClient {
    /// Put a batch of entries to the stream
    ///
    /// # Errors
    /// `DeliveryRetryable` for transient failures, anything else is fatal
    async fn put_records(
        &self,
        stream: &str,
        entries: &[RequestEntry],
    ) -> Result<PutRecordsOutput, ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_tracks_payload() {
        let mut buffer = RequestBuffer::with_capacity(MAX_RECORDS_PER_PUT);
        buffer.push(RequestEntry {
            data: Bytes::from_static(b"{\"a\":1}"),
            partition_key: "pk".to_string(),
        });
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.payload_size(), 9);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.payload_size(), 0);
    }
}
