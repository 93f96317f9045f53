//! Configuration validation
//!
//! Rules:
//! - stream / region are required and non-empty
//! - partition_key must not be the reserved field `log`
//! - time_key_format must be a valid strftime format

use chrono::format::{Item, StrftimeItems};
use contracts::{ContractError, OutputConfig};

/// Field name that cannot be used as the partition key
pub const RESERVED_PARTITION_KEY: &str = "log";

/// Validate an OutputConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &OutputConfig) -> Result<(), ContractError> {
    validate_required(config)?;
    validate_partition_key(config)?;
    validate_time_key_format(config)?;
    Ok(())
}

fn validate_required(config: &OutputConfig) -> Result<(), ContractError> {
    if config.stream.is_empty() || config.region.is_empty() {
        let field = if config.stream.is_empty() {
            "stream"
        } else {
            "region"
        };
        return Err(ContractError::config_validation(
            field,
            "stream and region are required configuration parameters",
        ));
    }
    Ok(())
}

fn validate_partition_key(config: &OutputConfig) -> Result<(), ContractError> {
    if config.partition_key.as_deref() == Some(RESERVED_PARTITION_KEY) {
        return Err(ContractError::config_validation(
            "partition_key",
            format!("'{RESERVED_PARTITION_KEY}' cannot be set as the partition key"),
        ));
    }
    Ok(())
}

fn validate_time_key_format(config: &OutputConfig) -> Result<(), ContractError> {
    if config.time_key.is_none() {
        return Ok(());
    }
    let invalid = StrftimeItems::new(&config.time_key_format).any(|item| matches!(item, Item::Error));
    if invalid {
        return Err(ContractError::config_validation(
            "time_key_format",
            format!("invalid strftime format '{}'", config.time_key_format),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = OutputConfig::new("s", "us-east-1");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_stream() {
        let config = OutputConfig::new("", "us-east-1");
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("'stream'"), "got: {err}");
        assert!(err.contains("required"), "got: {err}");
    }

    #[test]
    fn test_missing_region() {
        let config = OutputConfig::new("s", "");
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("'region'"), "got: {err}");
    }

    #[test]
    fn test_reserved_partition_key() {
        let mut config = OutputConfig::new("s", "us-east-1");
        config.partition_key = Some("log".into());
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cannot be set as the partition key"), "got: {err}");

        config.partition_key = Some("logger".into());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_time_key_format() {
        let mut config = OutputConfig::new("s", "us-east-1");
        config.time_key = Some("ts".into());
        config.time_key_format = "%Y-%m-%d %Q".into();
        assert!(validate(&config).is_err());

        config.time_key_format = "%Y-%m-%dT%H:%M:%S%.3fZ".into();
        assert!(validate(&config).is_ok());
    }
}
