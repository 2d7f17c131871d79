//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Descriptor names a type with no registered adapter
    #[error("sink not recognized: {type_tag}")]
    UnsupportedSinkType { type_tag: String },

    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Descriptor or sink error (from contract)
    #[error(transparent)]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create an unsupported sink type error
    pub fn unsupported(type_tag: impl Into<String>) -> Self {
        Self::UnsupportedSinkType {
            type_tag: type_tag.into(),
        }
    }

    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
