// # dnsync-core
//
// Core library for DNS record reconciliation.
//
// ## Architecture Overview
//
// Desired records come from a resource registry, observed records from an
// authoritative DNS provider. The core converges the latter toward the
// former:
// - **record**: Registry and canonical record types, and the normalizer
// - **compare**: Semantic equality with TTL tolerance and trailing-dot folding
// - **diff**: Change-set computation between desired and observed sets
// - **engine**: Apply engine, startup sequence and the event dispatcher
// - **traits**: `DnsProvider`, `ResourceRegistry` and `EventSource` seams
// - **plugin**: Factory registry for providers and registries
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP clients
// 2. **Stateless passes**: Everything is fetched fresh; nothing is cached
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library

pub mod compare;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod plugin;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use compare::equal;
pub use config::{EngineConfig, ProviderConfig, RegistryConfig, SyncConfig};
pub use diff::{Action, ChangeKey, ChangeSet, ChangeSetEntry, DiffKeying, diff};
pub use engine::{ActionOutcome, EngineEvent, PassReport, SyncContext, SyncEngine};
pub use error::{Error, ErrorKind, Result};
pub use plugin::PluginRegistry;
pub use record::{CanonicalRecord, DesiredRecord, Resource, ResourceValue, normalize};
pub use traits::{DnsProvider, Event, EventSource, ResourceRegistry, ResourceStatus};
