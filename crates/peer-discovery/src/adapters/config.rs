use crate::domain::{DiscoveryConfig, Node};
use crate::ports::ConfigProvider;

// ============================================================================
// StaticConfigProvider - In-memory config for testing/development
// ============================================================================

/// Static configuration provider.
///
/// Useful for testing and embedding. For deployments, use `TomlConfigProvider`.
#[derive(Debug, Clone)]
pub struct StaticConfigProvider {
    config: DiscoveryConfig,
}

impl StaticConfigProvider {
    /// Default config for `local_node` and no bootstrap nodes.
    #[must_use]
    pub fn new(local_node: Node) -> Self {
        Self {
            config: DiscoveryConfig::new(local_node),
        }
    }

    #[must_use]
    pub fn with_bootstrap_nodes(mut self, nodes: Vec<String>) -> Self {
        self.config.bootstrap_nodes = nodes;
        self
    }

    #[must_use]
    pub fn with_network_id(mut self, network_id: u32) -> Self {
        self.config.network_id = network_id;
        self
    }

    /// Replace the whole config.
    #[must_use]
    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn discovery_config(&self) -> DiscoveryConfig {
        self.config.clone()
    }
}

// ============================================================================
// TomlConfigProvider - Config file loading (requires "config" feature)
// ============================================================================

#[cfg(feature = "config")]
mod toml_config {
    use super::*;
    use crate::domain::NodeId;
    use serde::Deserialize;
    use std::fs;
    use std::path::Path;
    use thiserror::Error;

    /// Configuration file structure.
    #[derive(Debug, Deserialize)]
    struct ConfigFile {
        node: NodeSection,
        #[serde(default)]
        discovery: DiscoverySection,
    }

    #[derive(Debug, Deserialize)]
    struct NodeSection {
        id: String,
        host: String,
        port: u16,
    }

    #[derive(Debug, Deserialize, Default)]
    struct DiscoverySection {
        network_id: Option<u32>,
        #[serde(default)]
        bootstrap_nodes: Vec<String>,
        request_timeout_ms: Option<u64>,
        refresh_period_ms: Option<u64>,
        clean_period_ms: Option<u64>,
        allow_multiple_connections_per_host_port: Option<bool>,
        address_cache_size: Option<usize>,
        bucket_size: Option<usize>,
    }

    /// TOML-based configuration provider.
    ///
    /// # Config File Format
    ///
    /// ```toml
    /// [node]
    /// id = "<64 hex chars>"
    /// host = "127.0.0.1"
    /// port = 30305
    ///
    /// [discovery]
    /// network_id = 775
    /// bootstrap_nodes = ["10.0.0.1:30305"]
    /// request_timeout_ms = 3000
    /// refresh_period_ms = 60000
    /// clean_period_ms = 15000
    /// allow_multiple_connections_per_host_port = false
    /// address_cache_size = 200
    /// bucket_size = 16
    /// ```
    ///
    /// Keys missing from `[discovery]` keep their defaults.
    #[derive(Debug, Clone)]
    pub struct TomlConfigProvider {
        config: DiscoveryConfig,
    }

    impl TomlConfigProvider {
        /// Load configuration from a TOML file.
        ///
        /// # Errors
        ///
        /// Returns error if the file cannot be read, parsed or validated.
        pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
            let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;

            Self::parse(&content)
        }

        /// Parse configuration from a TOML string.
        pub fn parse(content: &str) -> Result<Self, ConfigError> {
            let file: ConfigFile =
                toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

            let id = NodeId::from_hex(&file.node.id)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            let mut config = DiscoveryConfig::new(Node::new(id, file.node.host, file.node.port));

            let d = file.discovery;
            config.bootstrap_nodes = d.bootstrap_nodes;
            config.network_id = d.network_id.unwrap_or(config.network_id);
            config.request_timeout_ms = d.request_timeout_ms.unwrap_or(config.request_timeout_ms);
            config.refresh_period_ms = d.refresh_period_ms.unwrap_or(config.refresh_period_ms);
            config.clean_period_ms = d.clean_period_ms.unwrap_or(config.clean_period_ms);
            config.allow_multiple_connections_per_host_port = d
                .allow_multiple_connections_per_host_port
                .unwrap_or(config.allow_multiple_connections_per_host_port);
            config.address_cache_size = d.address_cache_size.unwrap_or(config.address_cache_size);
            config.bucket_size = d.bucket_size.unwrap_or(config.bucket_size);

            Self::validate(&config)?;
            Ok(Self { config })
        }

        fn validate(config: &DiscoveryConfig) -> Result<(), ConfigError> {
            let positive = [
                ("request_timeout_ms", config.request_timeout_ms),
                ("refresh_period_ms", config.refresh_period_ms),
                ("clean_period_ms", config.clean_period_ms),
                ("address_cache_size", config.address_cache_size as u64),
                ("bucket_size", config.bucket_size as u64),
            ];
            match positive.iter().find(|(_, value)| *value == 0) {
                Some((key, _)) => Err(ConfigError::Invalid(format!("{} must be positive", key))),
                None => Ok(()),
            }
        }
    }

    impl ConfigProvider for TomlConfigProvider {
        fn discovery_config(&self) -> DiscoveryConfig {
            self.config.clone()
        }
    }

    /// Errors that can occur during config loading.
    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ConfigError {
        /// File I/O error.
        #[error("failed to read config file {path}: {error}")]
        Io {
            /// Path of the file that failed to load.
            path: String,
            /// Error message from the I/O operation.
            error: String,
        },
        /// TOML syntax or type error.
        #[error("failed to parse config: {0}")]
        Parse(String),
        /// Well-formed but unusable value.
        #[error("invalid config: {0}")]
        Invalid(String),
    }
}

#[cfg(feature = "config")]
pub use toml_config::{ConfigError, TomlConfigProvider};
