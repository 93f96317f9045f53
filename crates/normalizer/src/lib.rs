//! # Normalizer
//!
//! Record normalization for host flush batches.
//!
//! Responsibilities:
//! - Decode the host's msgpack batch into `(timestamp, record)` entries
//! - Resolve each record's timestamp (host time, epoch seconds, wall clock)
//! - Validate records without dropping them (visibility over filtering)
//!
//! ## Usage Example
//!
//! ```ignore
//! use normalizer::{normalize, MsgpackDecoder};
//!
//! let batch = normalize(MsgpackDecoder::new(raw_bytes));
//! println!("{} records, all valid: {}", batch.count(), batch.all_valid);
//! ```

mod decoder;
mod normalize;
mod timestamp;

// Re-exports
pub use contracts::{NormalizedBatch, NormalizedRecord, RawEntry};
pub use decoder::{MsgpackDecoder, EVENT_TIME_EXT_TYPE};
pub use normalize::{normalize, normalize_msgpack};
pub use timestamp::resolve_timestamp;
