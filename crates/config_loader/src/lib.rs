//! # Config Loader
//!
//! Configuration loading and validation for stream output instances.
//!
//! Responsibilities:
//! - Read recognized options from a [`ConfigSource`] (the host or a file)
//! - Parse TOML/JSON option files
//! - Validate and produce an [`OutputConfig`]
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use contracts::InstanceId;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("output.toml"), InstanceId(0)).unwrap();
//! println!("Stream: {}", config.stream);
//! ```

mod parser;
mod validator;

pub use contracts::OutputConfig;
pub use parser::{ConfigFormat, OptionMap};
pub use validator::RESERVED_PARTITION_KEY;

use contracts::{ConfigSource, ContractError, InstanceId};
use std::path::Path;
use tracing::{info, warn};

/// Recognized option keys
pub mod keys {
    pub const STREAM: &str = "stream";
    pub const REGION: &str = "region";
    pub const DATA_KEYS: &str = "data_keys";
    pub const PARTITION_KEY: &str = "partition_key";
    pub const ROLE_ARN: &str = "role_arn";
    pub const ENDPOINT: &str = "endpoint";
    pub const APPEND_NEWLINE: &str = "append_newline";
    pub const TIME_KEY: &str = "time_key";
    pub const TIME_KEY_FORMAT: &str = "time_key_format";
}

/// Configuration loader
///
/// Provides static methods to build an [`OutputConfig`] from the host,
/// from files or from strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Build and validate configuration from a per-key source
    ///
    /// Every recognized parameter is logged with the instance id.
    ///
    /// # Errors
    /// - Validation failure (missing stream/region, reserved partition key,
    ///   invalid time format)
    pub fn from_source<S: ConfigSource + ?Sized>(
        source: &S,
        id: InstanceId,
    ) -> Result<OutputConfig, ContractError> {
        let read = |key: &str| {
            let value = source.config_value(key).unwrap_or_default();
            info!(instance = %id, parameter = key, value = %value, "plugin parameter");
            value
        };

        let stream = read(keys::STREAM);
        let region = read(keys::REGION);
        let data_keys = read(keys::DATA_KEYS);
        let partition_key = read(keys::PARTITION_KEY);
        let role_arn = read(keys::ROLE_ARN);
        let endpoint = read(keys::ENDPOINT);
        let append_newline = read(keys::APPEND_NEWLINE);
        let time_key = read(keys::TIME_KEY);
        let time_key_format = read(keys::TIME_KEY_FORMAT);

        let mut config = OutputConfig::new(stream, region);
        config.data_keys = split_list(&data_keys);
        config.partition_key = non_empty(partition_key);
        config.role_arn = non_empty(role_arn);
        config.endpoint = non_empty(endpoint);
        config.append_newline = parse_bool(&append_newline);
        config.time_key = non_empty(time_key);
        if let Some(format) = non_empty(time_key_format) {
            if config.time_key.is_none() {
                warn!(instance = %id, "time_key_format is set without time_key, ignoring");
            }
            config.time_key_format = format;
        }

        validator::validate(&config)?;

        if config.partition_key.is_none() {
            info!(
                instance = %id,
                "no partition key provided, a random one will be generated"
            );
        }

        Ok(config)
    }

    /// Load configuration from an option file
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path, id: InstanceId) -> Result<OutputConfig, ContractError> {
        let options = Self::load_options_from_path(path)?;
        Self::from_source(&options, id)
    }

    /// Load configuration from a string
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
        id: InstanceId,
    ) -> Result<OutputConfig, ContractError> {
        let options = parser::parse(content, format)?;
        Self::from_source(&options, id)
    }

    /// Read an option file without validating it
    pub fn load_options_from_path(path: &Path) -> Result<OptionMap, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        parser::parse(&content, format)
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Case-insensitive `"true"`; anything else is false
fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
