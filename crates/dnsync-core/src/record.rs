//! Record model and normalization
//!
//! Three shapes of DNS record flow through the system:
//!
//! - [`DesiredRecord`]: what a registry resource asks to be published
//! - [`Resource`]: the registry envelope carrying an id and a typed value
//! - [`CanonicalRecord`]: the provider-agnostic shape used for comparison
//!   and for every remote call. Records read back from the provider use the
//!   same type with `origin_id` left empty.
//!
//! [`normalize`] is the only way a desired record becomes canonical.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host sentinel meaning "apex of the managed domain"
pub const APEX_HOST: &str = "@";

/// Priority prefixed to every MX value. Not configurable.
pub const DEFAULT_MX_PRIORITY: u16 = 10;

/// A DNS record requested by a registry resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    /// Registry-assigned resource id, used for status callbacks
    #[serde(default)]
    pub id: String,
    /// Host name relative to the managed domain, or `@` for the apex
    pub host: String,
    /// Record type (A, AAAA, CNAME, MX, TXT, ...), case-insensitive
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record payload. For MX records the priority is not part of it.
    pub value: String,
}

impl DesiredRecord {
    /// Create a desired record
    pub fn new(
        id: impl Into<String>,
        host: impl Into<String>,
        record_type: impl Into<String>,
        ttl: u32,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            record_type: record_type.into(),
            ttl,
            value: value.into(),
        }
    }
}

impl fmt::Display for DesiredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"{}\" {} {} \"{}\"}}",
            self.host, self.record_type, self.ttl, self.value
        )
    }
}

/// Typed payload of a registry resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValue {
    /// A DNS record resource
    Dns(DesiredRecord),
    /// Any other resource type; carried so it can be logged and dropped
    Other {
        /// The registry's type tag
        kind: String,
    },
}

/// A resource handed out by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawResource", into = "RawResource")]
pub struct Resource {
    /// Registry-assigned id
    pub id: String,
    /// Typed payload
    pub value: ResourceValue,
}

impl Resource {
    /// Create a DNS resource. The record's `id` is overwritten with `id`.
    pub fn dns(id: impl Into<String>, mut record: DesiredRecord) -> Self {
        let id = id.into();
        record.id = id.clone();
        Self {
            id,
            value: ResourceValue::Dns(record),
        }
    }

    /// Create a resource of some other type
    pub fn other(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: ResourceValue::Other { kind: kind.into() },
        }
    }

    /// The DNS record carried by this resource, if it is DNS-typed
    pub fn as_dns(&self) -> Option<&DesiredRecord> {
        match &self.value {
            ResourceValue::Dns(record) => Some(record),
            ResourceValue::Other { .. } => None,
        }
    }

    /// The registry type tag of this resource
    pub fn kind(&self) -> &str {
        match &self.value {
            ResourceValue::Dns(_) => DNS_RESOURCE_KIND,
            ResourceValue::Other { kind } => kind,
        }
    }
}

const DNS_RESOURCE_KIND: &str = "dns";

/// Wire form of a resource: `{"id": .., "type": .., "value": {..}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawResource {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: serde_json::Value,
}

impl TryFrom<RawResource> for Resource {
    type Error = String;

    fn try_from(raw: RawResource) -> Result<Self, Self::Error> {
        if !raw.kind.eq_ignore_ascii_case(DNS_RESOURCE_KIND) {
            return Ok(Resource::other(raw.id, raw.kind));
        }

        let record: DesiredRecord = serde_json::from_value(raw.value)
            .map_err(|e| format!("Invalid DNS value for resource {}: {}", raw.id, e))?;

        Ok(Resource::dns(raw.id, record))
    }
}

impl From<Resource> for RawResource {
    fn from(resource: Resource) -> Self {
        match resource.value {
            ResourceValue::Dns(record) => RawResource {
                id: resource.id,
                kind: DNS_RESOURCE_KIND.to_string(),
                value: serde_json::json!({
                    "host": record.host,
                    "type": record.record_type,
                    "ttl": record.ttl,
                    "value": record.value,
                }),
            },
            ResourceValue::Other { kind } => RawResource {
                id: resource.id,
                kind,
                value: serde_json::Value::Null,
            },
        }
    }
}

/// Normalized, provider-agnostic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Record name; the apex is the managed domain itself
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record values; the registry authors exactly one
    pub values: Vec<String>,
    /// Id of the desired record this was derived from. Never set on
    /// records read back from the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<String>,
}

impl CanonicalRecord {
    /// Create a record without an origin (the shape providers return)
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        ttl: u32,
        values: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ttl,
            values,
            origin_id: None,
        }
    }

    /// Attach the originating desired record id
    pub fn with_origin(mut self, origin_id: impl Into<String>) -> Self {
        self.origin_id = Some(origin_id.into());
        self
    }

    /// First value, or the empty string for a record with no values
    pub fn first_value(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for CanonicalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"{}\" {} {} {:?}}}",
            self.name, self.record_type, self.ttl, self.values
        )
    }
}

/// Map a desired record into its canonical shape.
///
/// - MX values get `"10 "` prefixed
/// - the `@` host becomes `managed_domain`
///
/// Nothing else is touched and nothing is validated; malformed input is
/// passed through for the provider to reject. The input is borrowed, so
/// normalizing the same record on every pass always yields the same output.
pub fn normalize(desired: &DesiredRecord, managed_domain: &str) -> CanonicalRecord {
    let value = if desired.record_type.eq_ignore_ascii_case("MX") {
        format!("{} {}", DEFAULT_MX_PRIORITY, desired.value)
    } else {
        desired.value.clone()
    };

    let name = if desired.host == APEX_HOST {
        managed_domain.to_string()
    } else {
        desired.host.clone()
    };

    CanonicalRecord {
        name,
        record_type: desired.record_type.clone(),
        ttl: desired.ttl,
        values: vec![value],
        origin_id: Some(desired.id.clone()),
    }
}
