//! Startup sequence
//!
//! Registers this process as the registry's DNS provider, resolves the
//! managed domain and checks that the provider manages it. Every fatal path
//! gives up the provider role before returning the error.

use super::SyncContext;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, ResourceRegistry};
use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

/// Run the startup sequence and build the engine context
pub(crate) async fn connect(
    provider: Box<dyn DnsProvider>,
    registry: Box<dyn ResourceRegistry>,
    config: &EngineConfig,
) -> Result<SyncContext> {
    if config.startup_delay_secs > 0 {
        debug!("Waiting {}s before registering", config.startup_delay_secs);
        sleep(Duration::from_secs(config.startup_delay_secs)).await;
    }

    let role = config.provider_role.as_str();

    match registry.register_provider(role).await {
        Ok(()) => info!("Registered as '{}' provider with {}", role, registry.registry_name()),
        Err(Error::AlreadyRegistered(msg)) => {
            warn!("Already registered as '{}' provider: {}", role, msg);
        }
        Err(e) => {
            return Err(abort(
                registry.as_ref(),
                role,
                Error::registry(format!("Failed to register as '{}' provider: {}", role, e)),
            )
            .await);
        }
    }

    let domain = match registry.get_domain().await {
        Ok(domain) if domain.is_empty() => {
            return Err(abort(
                registry.as_ref(),
                role,
                Error::config("No domain name configured in the registry"),
            )
            .await);
        }
        Ok(domain) => domain,
        Err(e) => {
            return Err(abort(
                registry.as_ref(),
                role,
                Error::registry(format!("Failed to retrieve domain name: {}", e)),
            )
            .await);
        }
    };
    info!("Using domain '{}'", domain);

    if let Err(e) = provider.get_domain(&domain).await {
        return Err(abort(
            registry.as_ref(),
            role,
            Error::provider(
                provider.provider_name(),
                format!("Failed to retrieve domain {}: {}", domain, e),
            ),
        )
        .await);
    }

    Ok(SyncContext::new(provider, registry, domain, role))
}

/// Give up the provider role; failures are logged and ignored
pub(crate) async fn deregister(registry: &dyn ResourceRegistry, role: &str) {
    match registry.deregister_provider(role).await {
        Ok(()) => info!("Deregistered as '{}' provider", role),
        Err(e) => warn!("Could not deregister as '{}' provider: {}", role, e),
    }
}

async fn abort(registry: &dyn ResourceRegistry, role: &str, err: Error) -> Error {
    deregister(registry, role).await;
    err
}
