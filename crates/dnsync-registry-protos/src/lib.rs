// # Protos Resource Registry
//
// `ResourceRegistry` and `EventSource` implementations for the Protos
// internal HTTP API.
//
// ## Architecture
//
// - [`ProtosRegistry`]: one request per trait call, application id in the
//   `Appid` header, status codes mapped to typed errors (a 409 on
//   registration means the provider role is already held)
// - [`ProtosEventSource`]: polls the resource list and forwards new or
//   modified DNS resources as `ResourceChanged` events
//
// ## API Reference
//
// - List resources: GET `/internal/resource`
// - Set status: PUT `/internal/resource/:id/status` `{"status": "created"}`
// - Register provider: POST `/internal/provider/:role`
// - Deregister provider: DELETE `/internal/provider/:role`
// - Managed domain: GET `/internal/info/domain` `{"domain": "example.com"}`

mod client;
mod events;

pub use client::{ProtosRegistry, decode_resources, registration_error, status_error};
pub use events::{ChangeTracker, ProtosEventSource};

use dnsync_core::config::RegistryConfig;
use dnsync_core::traits::{EventSource, ResourceRegistry, ResourceRegistryFactory};
use dnsync_core::{Error, PluginRegistry, Result};
use std::time::Duration;

/// Factory for creating Protos registry clients and event sources
pub struct ProtosFactory;

impl ProtosFactory {
    fn client(config: &RegistryConfig) -> Result<(ProtosRegistry, Duration)> {
        match config {
            RegistryConfig::Protos {
                endpoint,
                app_id,
                poll_interval_secs,
            } => {
                config.validate()?;
                let registry = ProtosRegistry::new(endpoint, app_id.clone())?;
                Ok((registry, Duration::from_secs(*poll_interval_secs)))
            }
            _ => Err(Error::config("Invalid config for Protos registry")),
        }
    }
}

impl ResourceRegistryFactory for ProtosFactory {
    fn create(&self, config: &RegistryConfig) -> Result<Box<dyn ResourceRegistry>> {
        let (registry, _) = Self::client(config)?;
        Ok(Box::new(registry))
    }

    fn create_event_source(&self, config: &RegistryConfig) -> Result<Box<dyn EventSource>> {
        let (registry, poll_interval) = Self::client(config)?;
        Ok(Box::new(ProtosEventSource::new(registry, poll_interval)))
    }
}

/// Register the Protos registry with a plugin registry
pub fn register(plugins: &PluginRegistry) {
    plugins.register_registry(client::REGISTRY_NAME, Box::new(ProtosFactory));
}
