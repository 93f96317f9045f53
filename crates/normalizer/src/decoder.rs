//! Msgpack batch decoder
//!
//! A host batch is a concatenation of msgpack entries, each either
//! `[timestamp, record]` or `[[timestamp, metadata], record]`.

use chrono::DateTime;
use contracts::{ContractError, HostTimestamp, LogValue, RawEntry, Record};
use rmpv::Value;

/// Msgpack extension type carrying host EventTime (u32 BE secs, u32 BE nanos)
pub const EVENT_TIME_EXT_TYPE: i8 = 0;

/// Iterator over the entries of one raw batch
///
/// Yields `None` at end of batch and `Some(Err(..))` on malformed input;
/// after an error the iterator is exhausted.
pub struct MsgpackDecoder<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> MsgpackDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes consumed so far
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for MsgpackDecoder<'_> {
    type Item = Result<RawEntry, ContractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }

        let start = self.offset;
        let mut cursor = &self.data[start..];
        let result = rmpv::decode::read_value(&mut cursor)
            .map_err(|e| ContractError::decode(start, e.to_string()))
            .and_then(|value| {
                self.offset = self.data.len() - cursor.len();
                decode_entry(value, start)
            });

        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

fn decode_entry(value: Value, offset: usize) -> Result<RawEntry, ContractError> {
    let Value::Array(items) = value else {
        return Err(ContractError::decode(offset, "entry is not an array"));
    };
    if items.len() < 2 {
        return Err(ContractError::decode(
            offset,
            format!("entry has {} elements, expected 2", items.len()),
        ));
    }

    let mut items = items.into_iter();
    let (Some(header), Some(body)) = (items.next(), items.next()) else {
        return Err(ContractError::decode(offset, "entry is truncated"));
    };

    // [[timestamp, metadata], record] carries the timestamp one level down
    let timestamp = match header {
        Value::Array(parts) => parts
            .first()
            .map(decode_timestamp)
            .unwrap_or(HostTimestamp::Unknown),
        other => decode_timestamp(&other),
    };

    let record = match body {
        Value::Map(pairs) => Some(
            pairs
                .into_iter()
                .map(|(k, v)| (to_log_value(k), to_log_value(v)))
                .collect::<Record>(),
        ),
        _ => None,
    };

    Ok(RawEntry { timestamp, record })
}

fn decode_timestamp(value: &Value) -> HostTimestamp {
    match value {
        Value::Ext(EVENT_TIME_EXT_TYPE, data) => {
            decode_event_time(data).unwrap_or(HostTimestamp::Unknown)
        }
        Value::Integer(n) => n
            .as_u64()
            .map(HostTimestamp::Seconds)
            .unwrap_or(HostTimestamp::Unknown),
        _ => HostTimestamp::Unknown,
    }
}

fn decode_event_time(data: &[u8]) -> Option<HostTimestamp> {
    if data.len() != 8 {
        return None;
    }
    let (secs, nanos) = data.split_at(4);
    let secs = u32::from_be_bytes(secs.try_into().ok()?);
    let nanos = u32::from_be_bytes(nanos.try_into().ok()?);
    DateTime::from_timestamp(i64::from(secs), nanos).map(HostTimestamp::EventTime)
}

fn to_log_value(value: Value) -> LogValue {
    match value {
        Value::Nil => LogValue::Nil,
        Value::Boolean(b) => LogValue::Bool(b),
        Value::Integer(n) => match (n.as_u64(), n.as_i64()) {
            (Some(u), _) => LogValue::UInt(u),
            (None, Some(i)) => LogValue::Int(i),
            (None, None) => LogValue::Nil,
        },
        Value::F32(f) => LogValue::Float(f64::from(f)),
        Value::F64(f) => LogValue::Float(f),
        Value::String(s) => {
            let text = s.as_str().map(str::to_owned);
            match text {
                Some(text) => LogValue::Str(text),
                None => LogValue::Bytes(s.into_bytes()),
            }
        }
        Value::Binary(b) => LogValue::Bytes(b),
        Value::Array(items) => LogValue::Array(items.into_iter().map(to_log_value).collect()),
        Value::Map(pairs) => LogValue::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (to_log_value(k), to_log_value(v)))
                .collect(),
        ),
        Value::Ext(tag, data) => LogValue::Ext(tag, data),
    }
}
