//! Core traits for the dnsync system
//!
//! This module defines the abstract interfaces of the engine's collaborators.
//!
//! - [`DnsProvider`]: Read and mutate records at the authoritative DNS provider
//! - [`ResourceRegistry`]: Fetch desired records and report their status
//! - [`EventSource`]: Deliver resource-changed, tick and terminate events

pub mod dns_provider;
pub mod event_source;
pub mod resource_registry;

pub use dns_provider::{DnsProvider, DnsProviderFactory};
pub use event_source::{Event, EventSource};
pub use resource_registry::{ResourceRegistry, ResourceRegistryFactory, ResourceStatus};
