// # Gandi LiveDNS Provider
//
// `DnsProvider` implementation for the Gandi LiveDNS v5 REST API.
//
// ## Behaviour
//
// - One HTTP request per trait call; no retries, no backoff, no caching
// - HTTP timeout of 30 seconds
// - Status codes mapped to typed errors (401/403, 404, 409, 429, 5xx)
// - Dry-run mode: reads go out, writes are logged and skipped
//
// ## Naming
//
// The engine names the apex record after the managed domain. LiveDNS uses
// `@` for it, so names are translated at this boundary in both directions.
//
// ## Security Requirements
//
// - The API key NEVER appears in logs or `Debug` output
// - Provider creation fails fast if the key is empty
//
// ## API Reference
//
// - Get domain: GET `/domains/:fqdn`
// - List records: GET `/domains/:fqdn/records`
// - Get record: GET `/domains/:fqdn/records/:name/:type`
// - Create record: POST `/domains/:fqdn/records`
// - Replace record: PUT `/domains/:fqdn/records/:name/:type`
// - Delete record: DELETE `/domains/:fqdn/records/:name/:type`

use async_trait::async_trait;
use dnsync_core::config::ProviderConfig;
use dnsync_core::record::{APEX_HOST, CanonicalRecord};
use dnsync_core::traits::{DnsProvider, DnsProviderFactory};
use dnsync_core::{Error, PluginRegistry, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// LiveDNS API base URL
pub const GANDI_API_BASE: &str = "https://dns.api.gandi.net/api/v5";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TTL LiveDNS applies when a record carries none
const DEFAULT_RRSET_TTL: u32 = 10800;

const PROVIDER_NAME: &str = "gandi";

/// A record set as exchanged with LiveDNS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub rrset_name: String,
    pub rrset_type: String,
    #[serde(default = "default_rrset_ttl")]
    pub rrset_ttl: u32,
    #[serde(default)]
    pub rrset_values: Vec<String>,
}

fn default_rrset_ttl() -> u32 {
    DEFAULT_RRSET_TTL
}

impl ZoneRecord {
    /// Convert into the engine's form, naming the apex after `domain`
    pub fn into_canonical(self, domain: &str) -> CanonicalRecord {
        let name = if self.rrset_name == APEX_HOST {
            domain.to_string()
        } else {
            self.rrset_name
        };
        CanonicalRecord::new(name, self.rrset_type, self.rrset_ttl, self.rrset_values)
    }
}

/// Body of a record replacement
#[derive(Debug, Serialize)]
struct RecordContent<'a> {
    rrset_ttl: u32,
    rrset_values: &'a [String],
}

/// Name of a record as LiveDNS expects it, relative to `domain`
///
/// The apex becomes `@`; a fully-qualified name inside the domain is
/// reduced to its relative part.
pub fn api_record_name<'a>(name: &'a str, domain: &str) -> &'a str {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.eq_ignore_ascii_case(domain) {
        return APEX_HOST;
    }
    if name.len() > domain.len() + 1 {
        let split = name.len() - domain.len();
        if name.is_char_boundary(split - 1)
            && name[split - 1..].starts_with('.')
            && name[split..].eq_ignore_ascii_case(domain)
        {
            return &name[..split - 1];
        }
    }
    name
}

/// Map a failed response to a typed error
pub fn status_error(status: u16, body: &str, context: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "{}: invalid API key or insufficient permissions. Status: {}",
            context, status
        )),
        404 => Error::not_found(format!("{}: {}", context, body.trim())),
        409 => Error::provider(
            PROVIDER_NAME,
            format!("{}: conflict with an existing record. Status: {}", context, status),
        ),
        429 => Error::rate_limited(format!("{}: rate limit exceeded. Status: {}", context, status)),
        500..=599 => Error::transport(format!(
            "{}: Gandi server error (transient): {} - {}",
            context,
            status,
            body.trim()
        )),
        _ => Error::provider(
            PROVIDER_NAME,
            format!("{}: {} - {}", context, status, body.trim()),
        ),
    }
}

/// Gandi LiveDNS provider
///
/// # Trust Level: Untrusted
///
/// Isolated, stateless and single-shot. Scheduling and convergence belong
/// to the engine.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (domain check, record reads)
/// - Log the intended POST/PUT/DELETE
/// - **NOT** actually modify DNS records
pub struct GandiProvider {
    /// LiveDNS API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform reads but skip writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for GandiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GandiProvider")
            .field("api_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl GandiProvider {
    /// Create a new Gandi provider
    ///
    /// # Parameters
    ///
    /// - `api_key`: LiveDNS API key
    /// - `api_url`: Base URL override, [`GANDI_API_BASE`] when `None`
    /// - `dry_run`: If true, perform reads but skip writes
    pub fn new(api_key: impl Into<String>, api_url: Option<String>, dry_run: bool) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::config("Gandi API key cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = api_url
            .as_deref()
            .unwrap_or(GANDI_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            base_url,
            client,
            dry_run,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn domain_url(&self, domain: &str) -> String {
        format!("{}/domains/{}", self.base_url, domain)
    }

    fn records_url(&self, domain: &str) -> String {
        format!("{}/records", self.domain_url(domain))
    }

    fn record_url(&self, domain: &str, name: &str, record_type: &str) -> String {
        format!(
            "{}/{}/{}",
            self.records_url(domain),
            api_record_name(name, domain),
            record_type.to_uppercase()
        )
    }

    /// Send a request and map transport failures and error statuses
    async fn send(&self, request: reqwest::RequestBuilder, context: &str) -> Result<reqwest::Response> {
        let response = request
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| Error::transport(format!("{}: HTTP request failed: {}", context, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(status_error(status.as_u16(), &body, context))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T> {
        response.json().await.map_err(|e| {
            Error::provider(
                PROVIDER_NAME,
                format!("{}: failed to parse response: {}", context, e),
            )
        })
    }
}

#[async_trait]
impl DnsProvider for GandiProvider {
    async fn get_domain(&self, domain: &str) -> Result<()> {
        let context = format!("domain {}", domain);
        self.send(self.client.get(self.domain_url(domain)), &context)
            .await?;
        tracing::debug!("Found domain {} via the Gandi API", domain);
        Ok(())
    }

    async fn get_record(
        &self,
        domain: &str,
        name: &str,
        record_type: &str,
    ) -> Result<CanonicalRecord> {
        let context = format!("record {}({})", name, record_type);
        let response = self
            .send(
                self.client.get(self.record_url(domain, name, record_type)),
                &context,
            )
            .await?;

        let record: ZoneRecord = Self::read_json(response, &context).await?;
        Ok(record.into_canonical(domain))
    }

    async fn list_records(&self, domain: &str) -> Result<Vec<CanonicalRecord>> {
        let context = format!("records of {}", domain);
        let response = self
            .send(self.client.get(self.records_url(domain)), &context)
            .await?;

        let records: Vec<ZoneRecord> = Self::read_json(response, &context).await?;
        tracing::debug!("Retrieved {} record(s) for {}", records.len(), domain);

        Ok(records
            .into_iter()
            .map(|r| r.into_canonical(domain))
            .collect())
    }

    async fn create_record(
        &self,
        domain: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        let payload = ZoneRecord {
            rrset_name: api_record_name(name, domain).to_string(),
            rrset_type: record_type.to_uppercase(),
            rrset_ttl: ttl,
            rrset_values: values.to_vec(),
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                self.records_url(domain),
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        let context = format!("create {}({})", name, record_type);
        self.send(
            self.client.post(self.records_url(domain)).json(&payload),
            &context,
        )
        .await?;
        Ok(())
    }

    async fn change_records(&self, domain: &str, records: &[CanonicalRecord]) -> Result<()> {
        for record in records {
            let url = self.record_url(domain, &record.name, &record.record_type);
            let payload = RecordContent {
                rrset_ttl: record.ttl,
                rrset_values: &record.values,
            };

            if self.dry_run {
                tracing::info!(
                    "[DRY-RUN] Would send PUT request to {} with payload: {}",
                    url,
                    serde_json::to_string(&payload)?
                );
                continue;
            }

            let context = format!("update {}({})", record.name, record.record_type);
            self.send(self.client.put(url).json(&payload), &context)
                .await?;
        }
        Ok(())
    }

    async fn delete_record(&self, domain: &str, name: &str, record_type: &str) -> Result<()> {
        let url = self.record_url(domain, name, record_type);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
            return Ok(());
        }

        let context = format!("delete {}({})", name, record_type);
        self.send(self.client.delete(url), &context).await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating Gandi providers
pub struct GandiFactory;

impl DnsProviderFactory for GandiFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Gandi {
                api_key,
                api_url,
                dry_run,
            } => {
                config.validate()?;

                if *dry_run {
                    tracing::warn!("Gandi provider running in DRY-RUN mode - no changes will be made");
                }

                Ok(Box::new(GandiProvider::new(
                    api_key.clone(),
                    api_url.clone(),
                    *dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Gandi provider")),
        }
    }
}

/// Register the Gandi provider with a plugin registry
///
/// # Example
///
/// ```rust
/// use dnsync_core::PluginRegistry;
///
/// let plugins = PluginRegistry::new();
/// dnsync_provider_gandi::register(&plugins);
/// assert!(plugins.has_provider("gandi"));
/// ```
pub fn register(plugins: &PluginRegistry) {
    plugins.register_provider(PROVIDER_NAME, Box::new(GandiFactory));
}
