//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::{keys, ConfigLoader, OptionMap};
use contracts::{ConfigSource, InstanceId, OutputConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<OutputConfig>,
}

impl ValidationResult {
    fn invalid(config_path: String, error: String) -> Self {
        Self {
            valid: false,
            config_path,
            error: Some(error),
            warnings: None,
            summary: None,
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        let error = format!("File not found: {}", args.config.display());
        return ValidationResult::invalid(config_path, error);
    }

    let options = match ConfigLoader::load_options_from_path(&args.config) {
        Ok(options) => options,
        Err(e) => return ValidationResult::invalid(config_path, e.to_string()),
    };

    match ConfigLoader::from_source(&options, InstanceId(0)) {
        Ok(config) => {
            let warnings = collect_warnings(&options, &config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(config),
            }
        }
        Err(e) => ValidationResult::invalid(config_path, e.to_string()),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(options: &OptionMap, config: &OutputConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.partition_key.is_none() {
        warnings.push("No partition_key - random partition keys will be generated".to_string());
    }

    let format_set = options
        .config_value(keys::TIME_KEY_FORMAT)
        .is_some_and(|format| !format.is_empty());
    if format_set && config.time_key.is_none() {
        warnings.push("time_key_format is set without time_key and has no effect".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Stream: {}", summary.stream);
            println!("  Region: {}", summary.region);
            if let Some(ref partition_key) = summary.partition_key {
                println!("  Partition key: {}", partition_key);
            }
            if !summary.data_keys.is_empty() {
                println!("  Data keys: {}", summary.data_keys.join(", "));
            }
            if let Some(ref time_key) = summary.time_key {
                println!("  Time key: {} ({})", time_key, summary.time_key_format);
            }
            println!("  Append newline: {}", summary.append_newline);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
