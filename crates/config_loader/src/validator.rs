//! Configuration validation
//!
//! Rules:
//! - sink descriptors are non-empty and unique
//! - cluster_name, when set, is not blank
//! - webhook_throttle_ms stays within a sane bound
//!
//! Descriptors are not parsed here: a malformed entry only disables that
//! sink, which is decided when sinks are built.

use std::collections::HashSet;

use contracts::{ContractError, EventerConfig};

/// Upper bound for the webhook pause between two sends
pub const MAX_WEBHOOK_THROTTLE_MS: u64 = 60_000;

/// Validate an EventerConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &EventerConfig) -> Result<(), ContractError> {
    validate_sinks(config)?;
    validate_cluster_name(config)?;
    validate_throttle(config)?;
    Ok(())
}

fn validate_sinks(config: &EventerConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        let sink = sink.trim();
        if sink.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}]"),
                "sink descriptor cannot be empty",
            ));
        }
        if !seen.insert(sink) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}]"),
                format!("duplicate sink descriptor '{sink}'"),
            ));
        }
    }
    Ok(())
}

fn validate_cluster_name(config: &EventerConfig) -> Result<(), ContractError> {
    match config.cluster_name.as_deref() {
        Some(name) if name.trim().is_empty() => Err(ContractError::config_validation(
            "cluster_name",
            "cluster_name cannot be blank",
        )),
        _ => Ok(()),
    }
}

fn validate_throttle(config: &EventerConfig) -> Result<(), ContractError> {
    if config.webhook_throttle_ms > MAX_WEBHOOK_THROTTLE_MS {
        return Err(ContractError::config_validation(
            "webhook_throttle_ms",
            format!(
                "webhook_throttle_ms must be <= {MAX_WEBHOOK_THROTTLE_MS}, got {}",
                config.webhook_throttle_ms
            ),
        ));
    }
    Ok(())
}
