//! Configuration types for the dnsync system
//!
//! This module defines all configuration structures used throughout the crate.

use crate::diff::DiffKeying;
use serde::{Deserialize, Serialize};

/// Main dnsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Resource registry configuration
    pub registry: RegistryConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            provider: ProviderConfig::default(),
            registry: RegistryConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.registry.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Gandi LiveDNS provider
    Gandi {
        /// LiveDNS API key
        api_key: String,
        /// API base URL override (defaults to the public v5 endpoint)
        #[serde(default)]
        api_url: Option<String>,
        /// Perform reads but only log writes
        #[serde(default)]
        dry_run: bool,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

// The API key must never reach the logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gandi {
                api_url, dry_run, ..
            } => f
                .debug_struct("Gandi")
                .field("api_key", &"<REDACTED>")
                .field("api_url", api_url)
                .field("dry_run", dry_run)
                .finish(),
            ProviderConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Gandi {
                api_key, api_url, ..
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("Gandi API key cannot be empty"));
                }
                if let Some(url) = api_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Gandi API URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Gandi { .. } => "gandi",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Gandi {
            api_key: String::new(),
            api_url: None,
            dry_run: false,
        }
    }
}

/// Resource registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryConfig {
    /// Protos internal API
    Protos {
        /// Base URL of the Protos instance (e.g. "http://protos:8080")
        endpoint: String,
        /// Application id sent with every request
        app_id: String,
        /// How often the resource list is polled for changes
        #[serde(default = "default_poll_interval_secs")]
        poll_interval_secs: u64,
    },

    /// Custom registry
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl RegistryConfig {
    /// Validate the registry configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            RegistryConfig::Protos {
                endpoint,
                app_id,
                poll_interval_secs,
            } => {
                if endpoint.is_empty() {
                    return Err(crate::Error::config("Protos endpoint cannot be empty"));
                }
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err(crate::Error::config(format!(
                        "Protos endpoint must use HTTP or HTTPS scheme. Got: {}",
                        endpoint
                    )));
                }
                if app_id.is_empty() {
                    return Err(crate::Error::config("Protos app id cannot be empty"));
                }
                if *poll_interval_secs == 0 {
                    return Err(crate::Error::config("Protos poll interval must be > 0"));
                }
                Ok(())
            }
            RegistryConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom registry factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom registry config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the registry type name
    pub fn type_name(&self) -> &str {
        match self {
            RegistryConfig::Protos { .. } => "protos",
            RegistryConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig::Protos {
            endpoint: "http://protos:8080".to_string(),
            app_id: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between full reconciliation passes (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Delay before registering with the registry (in seconds)
    ///
    /// Gives a freshly started container time to get its network address.
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new engine events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Provider role registered with the registry
    #[serde(default = "default_provider_role")]
    pub provider_role: String,

    /// Change-set keying for full passes
    #[serde(default)]
    pub diff_keying: DiffKeying,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Reconciliation interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.provider_role.is_empty() {
            return Err(crate::Error::config("Provider role cannot be empty"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            startup_delay_secs: default_startup_delay_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            provider_role: default_provider_role(),
            diff_keying: DiffKeying::default(),
        }
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_startup_delay_secs() -> u64 {
    0
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_provider_role() -> String {
    "dns".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}
