//! EventerConfig - Config Loader output
//!
//! Describes the sinks to build and the values injected into them.

use serde::{Deserialize, Serialize};

/// Default pause between two webhook sends
pub const DEFAULT_WEBHOOK_THROTTLE_MS: u64 = 50;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete eventer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventerConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Cluster name rendered into notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    /// Sink descriptors (`<type>://<address>?<options>`)
    #[serde(default)]
    pub sinks: Vec<String>,

    /// Pause after every webhook send, in milliseconds
    #[serde(default = "default_webhook_throttle_ms")]
    pub webhook_throttle_ms: u64,

    /// Prometheus exporter port (None = disabled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

fn default_webhook_throttle_ms() -> u64 {
    DEFAULT_WEBHOOK_THROTTLE_MS
}

impl Default for EventerConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::default(),
            cluster_name: None,
            sinks: Vec::new(),
            webhook_throttle_ms: DEFAULT_WEBHOOK_THROTTLE_MS,
            metrics_port: None,
        }
    }
}
