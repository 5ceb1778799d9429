// # Resource Registry Trait
//
// Defines the interface to the platform registry that owns the desired
// DNS records and tracks which of them have been published.
//
// ## Implementations
//
// - Protos internal API: `dnsync-registry-protos` crate

use crate::record::Resource;
use crate::traits::EventSource;
use async_trait::async_trait;
use std::fmt;

/// Status reported back to the registry for a resource
///
/// The registry only distinguishes "created" from unset; an updated record
/// is reported as created too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceStatus {
    /// The record is published at the provider
    Created,
}

impl ResourceStatus {
    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Created => "created",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for resource registry implementations
///
/// # Trust Level: Untrusted
///
/// Like providers, registries are single-shot: one call, one request, no
/// retries, no cached state between calls.
#[async_trait]
pub trait ResourceRegistry: Send + Sync {
    /// List every resource assigned to this provider
    async fn list_resources(&self) -> Result<Vec<Resource>, crate::Error>;

    /// Report the status of a resource
    async fn set_resource_status(
        &self,
        id: &str,
        status: ResourceStatus,
    ) -> Result<(), crate::Error>;

    /// Register as the provider for `role` (e.g. "dns")
    ///
    /// Must fail with [`crate::Error::AlreadyRegistered`] when the role is
    /// already held by this application.
    async fn register_provider(&self, role: &str) -> Result<(), crate::Error>;

    /// Give up the provider role
    async fn deregister_provider(&self, role: &str) -> Result<(), crate::Error>;

    /// The single domain managed through this registry
    async fn get_domain(&self) -> Result<String, crate::Error>;

    /// Get the registry name (for logging/debugging)
    fn registry_name(&self) -> &'static str;
}

/// Helper trait for constructing registries (and their event feeds) from
/// configuration
pub trait ResourceRegistryFactory: Send + Sync {
    /// Create a ResourceRegistry instance from configuration
    fn create(
        &self,
        config: &crate::config::RegistryConfig,
    ) -> Result<Box<dyn ResourceRegistry>, crate::Error>;

    /// Create the event source delivering this registry's notifications
    fn create_event_source(
        &self,
        config: &crate::config::RegistryConfig,
    ) -> Result<Box<dyn EventSource>, crate::Error>;
}
