//! Layered error definitions
//!
//! Categorized by source: config / descriptor / sink

use thiserror::Error;

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

    // ===== Descriptor Errors =====
    /// Sink descriptor could not be parsed
    #[error("malformed sink descriptor '{descriptor}': {message}")]
    MalformedDescriptor { descriptor: String, message: String },

    // ===== Sink Errors =====
    /// Sink options are missing or invalid
    #[error("sink '{sink_name}' config error: {message}")]
    SinkConfig { sink_name: String, message: String },

    /// One event could not be converted to the destination format
    #[error("sink '{sink_name}' translation error: {message}")]
    Translation { sink_name: String, message: String },

    /// Transport or protocol failure while delivering to the destination
    #[error("sink '{sink_name}' delivery error: {message}")]
    Delivery { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
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

    /// Create malformed descriptor error
    pub fn malformed_descriptor(descriptor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            descriptor: descriptor.into(),
            message: message.into(),
        }
    }

    /// Create sink config error
    pub fn sink_config(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConfig {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create translation error
    pub fn translation(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Translation {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create delivery error
    pub fn delivery(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
