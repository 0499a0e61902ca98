//! Client configuration with TOML file support.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use attest_network::ConnectOptions;
use attest_registry::NetworkRegistry;
use attest_types::{NetworkDescriptor, NetworkId};
use attest_utils::LogFormat;
use attest_verification::{ServiceOptions, DEFAULT_SCAN_DEPTH};

use crate::ClientError;

/// Configuration for an attest client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Network to connect to at start; the registry default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkId>,

    /// Time one endpoint may take to become ready.
    #[serde(default = "default_per_endpoint_timeout_ms")]
    pub per_endpoint_timeout_ms: u64,

    /// Time the whole failover sequence may take.
    #[serde(default = "default_overall_timeout_ms")]
    pub overall_timeout_ms: u64,

    /// Number of most recent blocks `verify` scans on a cache miss.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: u32,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Extra networks, or replacements for built-in ones with the same id.
    #[serde(default)]
    pub networks: Vec<NetworkDescriptor>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_per_endpoint_timeout_ms() -> u64 {
    10_000
}

fn default_overall_timeout_ms() -> u64 {
    30_000
}

fn default_scan_depth() -> u32 {
    DEFAULT_SCAN_DEPTH
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ClientError> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// The built-in network table with this config's overrides merged in.
    /// A configured `network` becomes the registry default.
    pub fn registry(&self) -> Result<NetworkRegistry, ClientError> {
        Ok(NetworkRegistry::builtin()?.with_overrides(self.networks.clone(), self.network.clone())?)
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            per_endpoint_timeout: Duration::from_millis(self.per_endpoint_timeout_ms),
            overall_timeout: Duration::from_millis(self.overall_timeout_ms),
        }
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            connect: self.connect_options(),
            scan_depth: self.scan_depth,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: None,
            per_endpoint_timeout_ms: default_per_endpoint_timeout_ms(),
            overall_timeout_ms: default_overall_timeout_ms(),
            scan_depth: default_scan_depth(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            networks: Vec::new(),
        }
    }
}
