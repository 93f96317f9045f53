//! OutputConfig - Config Loader output
//!
//! Immutable per-instance configuration of the stream output.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Default strftime format for the injected time key
pub const DEFAULT_TIME_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Validated configuration of one plugin instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Target stream name
    pub stream: String,

    /// Target service region
    pub region: String,

    /// Keys forwarded to the stream (empty = all keys)
    #[serde(default)]
    pub data_keys: Vec<String>,

    /// Field used to compute the partition key (`a->b` for nested fields)
    #[serde(default)]
    pub partition_key: Option<String>,

    /// Role to assume for delivery
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Service endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Append a line terminator to each serialized record
    #[serde(default)]
    pub append_newline: bool,

    /// Field name receiving the formatted record timestamp
    #[serde(default)]
    pub time_key: Option<String>,

    /// strftime format used for `time_key`
    #[serde(default = "default_time_key_format")]
    pub time_key_format: String,
}

fn default_time_key_format() -> String {
    DEFAULT_TIME_KEY_FORMAT.to_string()
}

impl OutputConfig {
    /// Minimal configuration with every optional option unset
    pub fn new(stream: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            region: region.into(),
            data_keys: Vec::new(),
            partition_key: None,
            role_arn: None,
            endpoint: None,
            append_newline: false,
            time_key: None,
            time_key_format: default_time_key_format(),
        }
    }
}

/// Per-key configuration lookup offered by the host
///
/// Implementations return `None` for unset keys; empty strings are treated
/// as unset by the config loader.
pub trait ConfigSource {
    fn config_value(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn config_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn config_value(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn config_value(&self, key: &str) -> Option<String> {
        (**self).config_value(key)
    }
}
