//! Batch normalization

use contracts::{ContractError, NormalizedBatch, NormalizedRecord, RawEntry, Record};
use observability::metrics::record_batch_normalized;
use tracing::{debug, error, info, instrument, warn};

use crate::decoder::MsgpackDecoder;
use crate::timestamp::resolve_timestamp;

/// Normalize decoded entries into an ordered batch
///
/// Decoding stops at the end of `entries` or at the first decode error;
/// records decoded before an error are kept. Invalid records (null or not
/// serializable) are retained and flagged, never dropped.
#[instrument(name = "normalize_batch", skip_all)]
pub fn normalize<I>(entries: I) -> NormalizedBatch
where
    I: IntoIterator<Item = Result<RawEntry, ContractError>>,
{
    let mut batch = NormalizedBatch {
        records: Vec::new(),
        all_valid: true,
        decode_error: None,
    };

    for (index, entry) in entries.into_iter().enumerate() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!(position = index, error = %e, "malformed batch, decoding stopped");
                batch.decode_error = Some(e.to_string());
                batch.all_valid = false;
                break;
            }
        };

        let timestamp = resolve_timestamp(&entry.timestamp);
        let valid = check_serializable(index, entry.record.as_ref());
        batch.all_valid &= valid;
        batch.records.push(NormalizedRecord {
            record: entry.record,
            timestamp,
            valid,
        });
    }

    let invalid = batch.records.iter().filter(|r| !r.valid).count();
    info!(
        records = batch.count(),
        invalid,
        all_valid = batch.all_valid,
        "processed records"
    );
    record_batch_normalized(batch.count(), invalid, batch.decode_error.is_some());

    batch
}

/// Decode and normalize one raw host batch
pub fn normalize_msgpack(data: &[u8]) -> NormalizedBatch {
    normalize(MsgpackDecoder::new(data))
}

/// Serialize the record to validate it (the encoding is discarded)
fn check_serializable(index: usize, record: Option<&Record>) -> bool {
    let Some(record) = record else {
        warn!(index, "null record");
        return false;
    };

    match record.to_json() {
        Ok(data) if data.is_empty() => {
            warn!(index, "record has zero length");
            false
        }
        Ok(data) => {
            debug!(index, record = %String::from_utf8_lossy(&data), "unpacked record");
            true
        }
        Err(e) => {
            warn!(index, error = %e, "record failed to serialize");
            false
        }
    }
}
