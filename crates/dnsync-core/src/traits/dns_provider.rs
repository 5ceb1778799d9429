// # DNS Provider Trait
//
// Defines the interface for reading and mutating records at the
// authoritative DNS provider.
//
// ## Implementations
//
// - Gandi LiveDNS: `dnsync-provider-gandi` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsync_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     provider.get_domain("example.com").await?;
//     for record in provider.list_records("example.com").await? {
//         println!("{}", record);
//     }
//
//     Ok(())
// }
// ```

use crate::record::CanonicalRecord;
use async_trait::async_trait;

/// Trait for DNS provider implementations
///
/// Records are exchanged in canonical form: the apex is named after the
/// managed domain itself, whatever convention the provider's API uses.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or a typed error
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (the next reconciliation pass is the retry)
/// - ❌ Decide whether a change is needed (owned by the diff engine)
/// - ❌ Cache records beyond a single request
/// - ❌ Talk to the resource registry
///
/// # Errors
///
/// A missing record or domain MUST be reported as [`crate::Error::NotFound`].
/// The single-record path creates a record when, and only when, the lookup
/// fails with that variant.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Check that `domain` exists and is managed by this account
    async fn get_domain(&self, domain: &str) -> Result<(), crate::Error>;

    /// Fetch one record by name and type
    ///
    /// # Returns
    ///
    /// - `Ok(CanonicalRecord)`: The observed record
    /// - `Err(Error::NotFound)`: No such record
    /// - `Err(Error)`: Any other failure
    async fn get_record(
        &self,
        domain: &str,
        name: &str,
        record_type: &str,
    ) -> Result<CanonicalRecord, crate::Error>;

    /// List every record of the domain
    async fn list_records(&self, domain: &str) -> Result<Vec<CanonicalRecord>, crate::Error>;

    /// Create a record
    async fn create_record(
        &self,
        domain: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<(), crate::Error>;

    /// Replace records identified by name and type with the given content
    ///
    /// Each record is sent whole (ttl and values together), never patched.
    async fn change_records(
        &self,
        domain: &str,
        records: &[CanonicalRecord],
    ) -> Result<(), crate::Error>;

    /// Delete a record by name and type
    async fn delete_record(
        &self,
        domain: &str,
        name: &str,
        record_type: &str,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
