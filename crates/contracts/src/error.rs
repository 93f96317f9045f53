//! Layered error definitions
//!
//! Categorized by source: config / registry / decode / delivery

use thiserror::Error;

use crate::InstanceId;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Registry Errors =====
    /// Identifier was never issued by the registry
    #[error("unknown plugin instance {id} (registry holds {len})")]
    UnknownInstance { id: InstanceId, len: usize },

    /// Host context was never initialized with an instance
    #[error("host context carries no plugin instance")]
    MissingInstance,

    // ===== Record Errors =====
    /// Host batch could not be decoded
    #[error("batch decode error at byte {offset}: {message}")]
    Decode { offset: usize, message: String },

    /// Record could not be encoded for delivery
    #[error("record encode error: {message}")]
    Encode { message: String },

    // ===== Delivery Errors =====
    /// Transient delivery failure, worth another attempt
    #[error("retryable delivery error on stream '{stream}': {message}")]
    DeliveryRetryable { stream: String, message: String },

    /// Non-retryable delivery failure
    #[error("fatal delivery error on stream '{stream}': {message}")]
    DeliveryFatal { stream: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create batch decode error
    pub fn decode(offset: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            offset,
            message: message.into(),
        }
    }

    /// Create record encode error
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create retryable delivery error
    pub fn delivery_retryable(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeliveryRetryable {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Create fatal delivery error
    pub fn delivery_fatal(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DeliveryFatal {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Whether a delivery attempt failing with this error may succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeliveryRetryable { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = ContractError::config_validation("stream", "required");
        assert_eq!(
            err.to_string(),
            "config validation error at 'stream': required"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ContractError::delivery_retryable("s", "throttled").is_retryable());
        assert!(!ContractError::delivery_fatal("s", "access denied").is_retryable());
        assert!(!ContractError::encode("bad key").is_retryable());
    }
}
