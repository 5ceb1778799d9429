//! Explicit collaborator context
//!
//! Built once at startup and borrowed by the dispatcher and the apply
//! engine. Nothing here is mutated after construction.

use crate::traits::{DnsProvider, ResourceRegistry};

/// Provider, registry and managed domain of one running engine
pub struct SyncContext {
    provider: Box<dyn DnsProvider>,
    registry: Box<dyn ResourceRegistry>,
    domain: String,
    provider_role: String,
}

impl SyncContext {
    /// Assemble a context from already-connected collaborators.
    ///
    /// [`crate::SyncEngine::connect`] performs the startup checks and builds
    /// the context itself; use this directly when the domain is known.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        registry: Box<dyn ResourceRegistry>,
        domain: impl Into<String>,
        provider_role: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            registry,
            domain: domain.into(),
            provider_role: provider_role.into(),
        }
    }

    pub fn provider(&self) -> &dyn DnsProvider {
        self.provider.as_ref()
    }

    pub fn registry(&self) -> &dyn ResourceRegistry {
        self.registry.as_ref()
    }

    /// The managed domain; also the canonical name of the apex record
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Role this process holds in the registry (e.g. "dns")
    pub fn provider_role(&self) -> &str {
        &self.provider_role
    }
}

impl std::fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncContext")
            .field("provider", &self.provider.provider_name())
            .field("registry", &self.registry.registry_name())
            .field("domain", &self.domain)
            .field("provider_role", &self.provider_role)
            .finish()
    }
}
