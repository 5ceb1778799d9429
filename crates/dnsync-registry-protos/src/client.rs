//! Protos internal API client
//!
//! Every request carries the application id in the `Appid` header. The
//! client is cheap to clone; clones share one connection pool.

use dnsync_core::record::Resource;
use dnsync_core::traits::{ResourceRegistry, ResourceStatus};
use dnsync_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const REGISTRY_NAME: &str = "protos";

/// Resource listing as returned by the API: keyed by id or a plain array
#[derive(Deserialize)]
#[serde(untagged)]
enum ResourceList {
    Map(BTreeMap<String, Value>),
    List(Vec<Value>),
}

#[derive(Serialize)]
struct StatusUpdate<'a> {
    status: &'a str,
}

#[derive(Deserialize)]
struct DomainInfo {
    #[serde(default)]
    domain: String,
}

/// Decode a resource listing, skipping entries that do not decode
pub fn decode_resources(body: &str) -> Result<Vec<Resource>> {
    let list: ResourceList = serde_json::from_str(body)
        .map_err(|e| Error::registry(format!("Malformed resource list: {}", e)))?;

    let items: Vec<Value> = match list {
        ResourceList::Map(map) => map.into_values().collect(),
        ResourceList::List(items) => items,
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Resource>(item) {
            Ok(resource) => Some(resource),
            Err(e) => {
                tracing::warn!("Dropping malformed resource: {}", e);
                None
            }
        })
        .collect())
}

/// Map a failed response to a typed error
pub fn status_error(status: u16, body: &str, context: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!("{}: app id rejected. Status: {}", context, status)),
        404 => Error::not_found(format!("{}: {}", context, body.trim())),
        429 => Error::rate_limited(format!("{}: rate limit exceeded. Status: {}", context, status)),
        500..=599 => Error::transport(format!(
            "{}: Protos server error (transient): {} - {}",
            context,
            status,
            body.trim()
        )),
        _ => Error::registry(format!("{}: {} - {}", context, status, body.trim())),
    }
}

/// Map a failed provider registration; 409 means the role is already held
pub fn registration_error(status: u16, body: &str, context: &str) -> Error {
    match status {
        409 => Error::already_registered(format!("{}: {}", context, body.trim())),
        _ => status_error(status, body, context),
    }
}

/// Client for the Protos internal API
#[derive(Debug, Clone)]
pub struct ProtosRegistry {
    /// Base URL without trailing slash
    base_url: String,

    /// Application id sent with every request
    app_id: String,

    client: reqwest::Client,
}

impl ProtosRegistry {
    /// Create a client for `endpoint` (e.g. "http://protos:8080")
    pub fn new(endpoint: impl AsRef<str>, app_id: impl Into<String>) -> Result<Self> {
        let app_id = app_id.into();
        if app_id.is_empty() {
            return Err(Error::config("Protos app id cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: endpoint.as_ref().trim_end_matches('/').to_string(),
            app_id,
            client,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/internal/{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, context: &str) -> Result<String> {
        let (status, body) = self.exchange(request, context).await?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body, context));
        }
        Ok(body)
    }

    async fn exchange(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<(reqwest::StatusCode, String)> {
        let response = request
            .header("Appid", &self.app_id)
            .send()
            .await
            .map_err(|e| Error::transport(format!("{}: HTTP request failed: {}", context, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("{}: failed to read response: {}", context, e)))?;

        Ok((status, body))
    }
}

#[async_trait::async_trait]
impl ResourceRegistry for ProtosRegistry {
    async fn list_resources(&self) -> Result<Vec<Resource>> {
        let body = self
            .send(self.client.get(self.url("resource")), "list resources")
            .await?;
        decode_resources(&body)
    }

    async fn set_resource_status(&self, id: &str, status: ResourceStatus) -> Result<()> {
        let url = self.url(&format!("resource/{}/status", id));
        let payload = StatusUpdate {
            status: status.as_str(),
        };

        self.send(
            self.client.put(url).json(&payload),
            &format!("set status of resource {}", id),
        )
        .await?;
        Ok(())
    }

    async fn register_provider(&self, role: &str) -> Result<()> {
        let url = self.url(&format!("provider/{}", role));
        let context = format!("register as '{}' provider", role);

        let (status, body) = self.exchange(self.client.post(url), &context).await?;
        if !status.is_success() {
            return Err(registration_error(status.as_u16(), &body, &context));
        }
        Ok(())
    }

    async fn deregister_provider(&self, role: &str) -> Result<()> {
        let url = self.url(&format!("provider/{}", role));
        self.send(
            self.client.delete(url),
            &format!("deregister as '{}' provider", role),
        )
        .await?;
        Ok(())
    }

    async fn get_domain(&self) -> Result<String> {
        let body = self
            .send(self.client.get(self.url("info/domain")), "get domain")
            .await?;
        let info: DomainInfo = serde_json::from_str(&body)
            .map_err(|e| Error::registry(format!("Malformed domain info: {}", e)))?;
        Ok(info.domain)
    }

    fn registry_name(&self) -> &'static str {
        REGISTRY_NAME
    }
}
