//! Plugin-based factory registry
//!
//! DNS providers and resource registries are registered by name at
//! startup and instantiated from configuration, so the daemon carries no
//! hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnsync_core::PluginRegistry;
//!
//! let plugins = PluginRegistry::new();
//! dnsync_provider_gandi::register(&plugins);
//! dnsync_registry_protos::register(&plugins);
//!
//! let provider = plugins.create_provider(&config.provider)?;
//! let registry = plugins.create_registry(&config.registry)?;
//! let events = plugins.create_event_source(&config.registry)?;
//! ```

use crate::config::{ProviderConfig, RegistryConfig};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory, EventSource, ResourceRegistry};
use crate::traits::ResourceRegistryFactory;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Factory registry for providers and resource registries
///
/// ## Thread Safety
///
/// Uses interior mutability with RwLock, allowing concurrent reads and
/// exclusive writes. A poisoned lock is recovered, since factories are
/// never left half-inserted.
#[derive(Default)]
pub struct PluginRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,

    /// Registered resource registry factories
    registries: RwLock<HashMap<String, Box<dyn ResourceRegistryFactory>>>,
}

impl PluginRegistry {
    /// Create a new empty plugin registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory under `name` (e.g. "gandi")
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), factory);
    }

    /// Register a resource registry factory under `name` (e.g. "protos")
    pub fn register_registry(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ResourceRegistryFactory>,
    ) {
        let mut registries = self.registries.write().unwrap_or_else(PoisonError::into_inner);
        registries.insert(name.into(), factory);
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If the provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        let provider_type = config.type_name();
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a resource registry client from configuration
    pub fn create_registry(&self, config: &RegistryConfig) -> Result<Box<dyn ResourceRegistry>> {
        let registry_type = config.type_name();
        let registries = self.registries.read().unwrap_or_else(PoisonError::into_inner);

        let factory = registries
            .get(registry_type)
            .ok_or_else(|| Error::config(format!("Unknown registry type: {}", registry_type)))?;

        factory.create(config)
    }

    /// Create the event source belonging to a registry configuration
    pub fn create_event_source(&self, config: &RegistryConfig) -> Result<Box<dyn EventSource>> {
        let registry_type = config.type_name();
        let registries = self.registries.read().unwrap_or_else(PoisonError::into_inner);

        let factory = registries
            .get(registry_type)
            .ok_or_else(|| Error::config(format!("Unknown registry type: {}", registry_type)))?;

        factory.create_event_source(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// List all registered registry types
    pub fn list_registries(&self) -> Vec<String> {
        let registries = self.registries.read().unwrap_or_else(PoisonError::into_inner);
        registries.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }

    /// Check if a registry type is registered
    pub fn has_registry(&self, name: &str) -> bool {
        let registries = self.registries.read().unwrap_or_else(PoisonError::into_inner);
        registries.contains_key(name)
    }
}
