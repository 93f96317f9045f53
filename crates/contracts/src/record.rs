//! Record model - Normalizer input and output
//!
//! A decoded log event is an ordered list of key/value pairs whose keys and
//! values may be any host value (msgpack does not restrict map keys).

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::ContractError;

/// A single host value of arbitrary depth
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    /// Raw bytes; encoded as (lossy) UTF-8 text
    Bytes(Vec<u8>),
    Array(Vec<LogValue>),
    Map(Vec<(LogValue, LogValue)>),
    /// Host extension value (type tag, payload)
    Ext(i8, Vec<u8>),
}

impl LogValue {
    /// View as text if the value is a string or byte string
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Str(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Bytes(b) => Some(String::from_utf8_lossy(b)),
            _ => None,
        }
    }

    /// Render scalars as text (used for partition keys)
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Self::Str(_) | Self::Bytes(_) => self.as_text().map(Cow::into_owned),
            Self::Int(v) => Some(v.to_string()),
            Self::UInt(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::Bool(v) => Some(v.to_string()),
            _ => None,
        }
    }

    fn key_matches(&self, key: &str) -> bool {
        self.as_text().is_some_and(|k| k == key)
    }
}

impl Serialize for LogValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Nil => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::UInt(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Str(v) => serializer.serialize_str(v),
            Self::Bytes(v) => serializer.serialize_str(&String::from_utf8_lossy(v)),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(pairs) => serialize_pairs(pairs, serializer),
            Self::Ext(_, data) => serializer.serialize_bytes(data),
        }
    }
}

fn serialize_pairs<S: Serializer>(
    pairs: &[(LogValue, LogValue)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for LogValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for LogValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A decoded log event (top-level mapping)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(LogValue, LogValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(fields: Vec<(LogValue, LogValue)>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(LogValue, LogValue)> {
        self.fields.iter()
    }

    /// Value stored under a text key
    pub fn get(&self, key: &str) -> Option<&LogValue> {
        self.fields
            .iter()
            .find(|(k, _)| k.key_matches(key))
            .map(|(_, v)| v)
    }

    /// Walk nested maps, e.g. `["kubernetes", "pod_name"]`
    pub fn lookup_path(&self, path: &[&str]) -> Option<&LogValue> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get(first)?;
        for segment in rest {
            let LogValue::Map(pairs) = current else {
                return None;
            };
            current = pairs
                .iter()
                .find(|(k, _)| k.key_matches(segment))
                .map(|(_, v)| v)?;
        }
        Some(current)
    }

    /// Insert or replace a text-keyed field
    pub fn insert(&mut self, key: impl Into<String>, value: LogValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| k.key_matches(&key)) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((LogValue::Str(key), value)),
        }
    }

    /// Copy of this record keeping only the listed text keys
    pub fn retain_keys(&self, keys: &[String]) -> Record {
        let fields = self
            .fields
            .iter()
            .filter(|(k, _)| keys.iter().any(|wanted| k.key_matches(wanted)))
            .cloned()
            .collect();
        Record { fields }
    }

    /// Canonical JSON encoding
    ///
    /// # Errors
    /// Fails when a key cannot be represented as a JSON object key
    pub fn to_json(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self).map_err(|e| ContractError::encode(e.to_string()))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.fields, serializer)
    }
}

impl FromIterator<(LogValue, LogValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (LogValue, LogValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Timestamp as supplied by the host decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostTimestamp {
    /// Structured host time (seconds + nanoseconds)
    EventTime(DateTime<Utc>),
    /// Whole seconds since the Unix epoch
    Seconds(u64),
    /// Host supplied neither
    Unknown,
}

/// One decoded `(timestamp, record)` entry
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub timestamp: HostTimestamp,
    /// `None` when the host sent a null / non-map record
    pub record: Option<Record>,
}

/// Record with resolved timestamp and validity flag
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub record: Option<Record>,
    pub timestamp: DateTime<Utc>,
    /// Diagnostic only; invalid records are still forwarded
    pub valid: bool,
}

/// Normalizer output for one flush call
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Host submission order
    pub records: Vec<NormalizedRecord>,
    /// True iff every record is valid and the batch decoded cleanly
    pub all_valid: bool,
    /// Set when decoding stopped on malformed input
    pub decode_error: Option<String>,
}

impl NormalizedBatch {
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
