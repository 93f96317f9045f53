//! Option file parsing
//!
//! Supports TOML (primary) and JSON. A file is a flat table of options;
//! scalar values are stringified the way the host hands them over.

use std::collections::BTreeMap;

use contracts::{ConfigSource, ContractError};
use serde::Deserialize;

/// Option file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A single option value as written in a file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OptionValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<String>),
}

impl OptionValue {
    fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::List(items) => items.join(","),
        }
    }
}

/// Flat, case-insensitive option table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    values: BTreeMap<String, String>,
}

impl OptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option (key is lowercased)
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(key.as_ref().to_lowercase(), value.into());
    }

    /// Builder-style [`OptionMap::insert`]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values.iter()
    }
}

impl ConfigSource for OptionMap {
    fn config_value(&self, key: &str) -> Option<String> {
        self.values.get(&key.to_lowercase()).cloned()
    }
}

fn into_option_map(raw: BTreeMap<String, OptionValue>) -> OptionMap {
    raw.into_iter()
        .fold(OptionMap::new(), |map, (k, v)| map.with(k, v.into_text()))
}

/// Parse TOML option file
pub fn parse_toml(content: &str) -> Result<OptionMap, ContractError> {
    toml::from_str::<BTreeMap<String, OptionValue>>(content)
        .map(into_option_map)
        .map_err(|e| ContractError::ConfigParse {
            message: format!("TOML parse error: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Parse JSON option file
pub fn parse_json(content: &str) -> Result<OptionMap, ContractError> {
    serde_json::from_str::<BTreeMap<String, OptionValue>>(content)
        .map(into_option_map)
        .map_err(|e| ContractError::ConfigParse {
            message: format!("JSON parse error: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Parse according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<OptionMap, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}
