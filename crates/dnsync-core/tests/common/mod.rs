//! Test doubles and common utilities for engine contract tests
//!
//! The doubles keep their state behind `Arc`s so a test can hand one copy
//! to the engine and keep another for assertions.

#![allow(dead_code)]

use dnsync_core::config::EngineConfig;
use dnsync_core::error::{Error, Result};
use dnsync_core::record::{CanonicalRecord, DesiredRecord, Resource};
use dnsync_core::traits::{DnsProvider, Event, EventSource, ResourceRegistry, ResourceStatus};
use dnsync_core::{SyncContext, SyncEngine};
use std::collections::HashSet;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::Stream;

pub const DOMAIN: &str = "example.com";

/// An in-memory DNS zone with call logging and failure injection
pub struct MemoryProvider {
    /// Records currently in the zone
    zone: Arc<Mutex<Vec<CanonicalRecord>>>,
    /// Mutations in call order, e.g. "create www/A"
    calls: Arc<Mutex<Vec<String>>>,
    /// Names whose mutations fail
    failing_names: Arc<Mutex<HashSet<String>>>,
    /// Whether list_records() fails
    fail_list: Arc<AtomicBool>,
    /// Whether get_record() fails with a transport error
    fail_lookup: Arc<AtomicBool>,
    /// Whether get_domain() fails
    fail_domain: Arc<AtomicBool>,
    /// Call counter for list_records()
    list_call_count: Arc<AtomicUsize>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<CanonicalRecord>) -> Self {
        Self {
            zone: Arc::new(Mutex::new(records)),
            calls: Arc::new(Mutex::new(Vec::new())),
            failing_names: Arc::new(Mutex::new(HashSet::new())),
            fail_list: Arc::new(AtomicBool::new(false)),
            fail_lookup: Arc::new(AtomicBool::new(false)),
            fail_domain: Arc::new(AtomicBool::new(false)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new MemoryProvider that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            zone: Arc::clone(&other.zone),
            calls: Arc::clone(&other.calls),
            failing_names: Arc::clone(&other.failing_names),
            fail_list: Arc::clone(&other.fail_list),
            fail_lookup: Arc::clone(&other.fail_lookup),
            fail_domain: Arc::clone(&other.fail_domain),
            list_call_count: Arc::clone(&other.list_call_count),
        }
    }

    pub fn records(&self) -> Vec<CanonicalRecord> {
        self.zone.lock().unwrap().clone()
    }

    pub fn find(&self, name: &str, record_type: &str) -> Option<CanonicalRecord> {
        self.zone
            .lock()
            .unwrap()
            .iter()
            .find(|r| same_slot(r, name, record_type))
            .cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of create/update/delete calls so far
    pub fn mutation_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn fail_mutations_for(&self, name: &str) {
        self.failing_names.lock().unwrap().insert(name.to_lowercase());
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_lookup(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_domain(&self, fail: bool) {
        self.fail_domain.store(fail, Ordering::SeqCst);
    }

    fn record_call(&self, op: &str, name: &str, record_type: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}/{}", op, name, record_type));

        if self.failing_names.lock().unwrap().contains(&name.to_lowercase()) {
            return Err(Error::transport(format!("injected failure for {}", name)));
        }
        Ok(())
    }
}

fn same_slot(record: &CanonicalRecord, name: &str, record_type: &str) -> bool {
    record.name.eq_ignore_ascii_case(name) && record.record_type.eq_ignore_ascii_case(record_type)
}

#[async_trait::async_trait]
impl DnsProvider for MemoryProvider {
    async fn get_domain(&self, domain: &str) -> Result<()> {
        if self.fail_domain.load(Ordering::SeqCst) {
            return Err(Error::not_found(format!("domain {}", domain)));
        }
        Ok(())
    }

    async fn get_record(
        &self,
        _domain: &str,
        name: &str,
        record_type: &str,
    ) -> Result<CanonicalRecord> {
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(Error::transport("connection reset"));
        }
        self.find(name, record_type)
            .ok_or_else(|| Error::not_found(format!("{}/{}", name, record_type)))
    }

    async fn list_records(&self, _domain: &str) -> Result<Vec<CanonicalRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::transport("connection refused"));
        }
        Ok(self.records())
    }

    async fn create_record(
        &self,
        _domain: &str,
        name: &str,
        record_type: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        self.record_call("create", name, record_type)?;
        self.zone.lock().unwrap().push(CanonicalRecord::new(
            name,
            record_type,
            ttl,
            values.to_vec(),
        ));
        Ok(())
    }

    async fn change_records(&self, _domain: &str, records: &[CanonicalRecord]) -> Result<()> {
        for record in records {
            self.record_call("update", &record.name, &record.record_type)?;

            let stored = CanonicalRecord::new(
                record.name.clone(),
                record.record_type.clone(),
                record.ttl,
                record.values.clone(),
            );
            let mut zone = self.zone.lock().unwrap();
            match zone
                .iter_mut()
                .find(|r| same_slot(r, &record.name, &record.record_type))
            {
                Some(existing) => *existing = stored,
                None => zone.push(stored),
            }
        }
        Ok(())
    }

    async fn delete_record(&self, _domain: &str, name: &str, record_type: &str) -> Result<()> {
        self.record_call("delete", name, record_type)?;
        self.zone
            .lock()
            .unwrap()
            .retain(|r| !same_slot(r, name, record_type));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// How register_provider() answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterBehavior {
    Accept,
    AlreadyRegistered,
    Refuse,
}

/// An in-memory resource registry that records status reports
pub struct MemoryRegistry {
    resources: Arc<Mutex<Vec<Resource>>>,
    statuses: Arc<Mutex<Vec<(String, ResourceStatus)>>>,
    domain: Arc<Mutex<String>>,
    register_behavior: Arc<Mutex<RegisterBehavior>>,
    fail_list: Arc<AtomicBool>,
    /// Resource ids whose status report fails
    failing_statuses: Arc<Mutex<HashSet<String>>>,
    fail_deregister: Arc<AtomicBool>,
    register_call_count: Arc<AtomicUsize>,
    deregister_call_count: Arc<AtomicUsize>,
}

impl MemoryRegistry {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            resources: Arc::new(Mutex::new(resources)),
            statuses: Arc::new(Mutex::new(Vec::new())),
            domain: Arc::new(Mutex::new(DOMAIN.to_string())),
            register_behavior: Arc::new(Mutex::new(RegisterBehavior::Accept)),
            fail_list: Arc::new(AtomicBool::new(false)),
            failing_statuses: Arc::new(Mutex::new(HashSet::new())),
            fail_deregister: Arc::new(AtomicBool::new(false)),
            register_call_count: Arc::new(AtomicUsize::new(0)),
            deregister_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a new MemoryRegistry that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            resources: Arc::clone(&other.resources),
            statuses: Arc::clone(&other.statuses),
            domain: Arc::clone(&other.domain),
            register_behavior: Arc::clone(&other.register_behavior),
            fail_list: Arc::clone(&other.fail_list),
            failing_statuses: Arc::clone(&other.failing_statuses),
            fail_deregister: Arc::clone(&other.fail_deregister),
            register_call_count: Arc::clone(&other.register_call_count),
            deregister_call_count: Arc::clone(&other.deregister_call_count),
        }
    }

    pub fn set_resources(&self, resources: Vec<Resource>) {
        *self.resources.lock().unwrap() = resources;
    }

    pub fn set_domain(&self, domain: &str) {
        *self.domain.lock().unwrap() = domain.to_string();
    }

    pub fn set_register_behavior(&self, behavior: RegisterBehavior) {
        *self.register_behavior.lock().unwrap() = behavior;
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_status_for(&self, id: &str) {
        self.failing_statuses.lock().unwrap().insert(id.to_string());
    }

    pub fn set_fail_deregister(&self, fail: bool) {
        self.fail_deregister.store(fail, Ordering::SeqCst);
    }

    /// Status reports in call order
    pub fn statuses(&self) -> Vec<(String, ResourceStatus)> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn reported_ids(&self) -> Vec<String> {
        self.statuses().into_iter().map(|(id, _)| id).collect()
    }

    pub fn register_call_count(&self) -> usize {
        self.register_call_count.load(Ordering::SeqCst)
    }

    pub fn deregister_call_count(&self) -> usize {
        self.deregister_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ResourceRegistry for MemoryRegistry {
    async fn list_resources(&self) -> Result<Vec<Resource>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Error::transport("registry unavailable"));
        }
        Ok(self.resources.lock().unwrap().clone())
    }

    async fn set_resource_status(&self, id: &str, status: ResourceStatus) -> Result<()> {
        if self.failing_statuses.lock().unwrap().contains(id) {
            return Err(Error::transport(format!("status report for {} rejected", id)));
        }
        self.statuses.lock().unwrap().push((id.to_string(), status));
        Ok(())
    }

    async fn register_provider(&self, role: &str) -> Result<()> {
        self.register_call_count.fetch_add(1, Ordering::SeqCst);
        match *self.register_behavior.lock().unwrap() {
            RegisterBehavior::Accept => Ok(()),
            RegisterBehavior::AlreadyRegistered => Err(Error::already_registered(role)),
            RegisterBehavior::Refuse => Err(Error::auth("invalid app id")),
        }
    }

    async fn deregister_provider(&self, _role: &str) -> Result<()> {
        self.deregister_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_deregister.load(Ordering::SeqCst) {
            return Err(Error::transport("registry unavailable"));
        }
        Ok(())
    }

    async fn get_domain(&self) -> Result<String> {
        Ok(self.domain.lock().unwrap().clone())
    }

    fn registry_name(&self) -> &'static str {
        "memory"
    }
}

/// An event source driven by the test through a channel
pub struct ControlledEventSource {
    engine_rx: Mutex<Option<mpsc::UnboundedReceiver<Event>>>,
}

impl ControlledEventSource {
    pub fn new() -> (Self, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            engine_rx: Mutex::new(Some(rx)),
        };
        (source, tx)
    }
}

impl EventSource for ControlledEventSource {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = Event> + Send + 'static>> {
        let rx = self
            .engine_rx
            .lock()
            .unwrap()
            .take()
            .expect("watch() can only be called once");

        Box::pin(tokio_stream::wrappers::UnboundedReceiverStream::new(rx))
    }
}

/// Engine settings for tests: no startup delay, a full pass only at start
pub fn test_engine_config() -> EngineConfig {
    EngineConfig {
        interval_secs: 3600,
        startup_delay_secs: 0,
        event_channel_capacity: 100,
        ..EngineConfig::default()
    }
}

/// A registry resource holding a DNS record
pub fn dns_resource(id: &str, host: &str, record_type: &str, ttl: u32, value: &str) -> Resource {
    Resource::dns(id, DesiredRecord::new(id, host, record_type, ttl, value))
}

pub fn observed(name: &str, record_type: &str, ttl: u32, value: &str) -> CanonicalRecord {
    CanonicalRecord::new(name, record_type, ttl, vec![value.to_string()])
}

/// Build an engine over shared doubles, skipping the startup sequence
pub fn build_engine(
    provider: &MemoryProvider,
    registry: &MemoryRegistry,
) -> (
    SyncEngine,
    mpsc::Receiver<dnsync_core::EngineEvent>,
    mpsc::UnboundedSender<Event>,
) {
    let ctx = SyncContext::new(
        Box::new(MemoryProvider::sharing_state_with(provider)),
        Box::new(MemoryRegistry::sharing_state_with(registry)),
        DOMAIN,
        "dns",
    );
    let (source, event_tx) = ControlledEventSource::new();
    let (engine, engine_rx) = SyncEngine::new(ctx, Box::new(source), test_engine_config())
        .expect("engine construction succeeds");

    (engine, engine_rx, event_tx)
}

/// Drain every engine event currently queued
pub fn drain(rx: &mut mpsc::Receiver<dnsync_core::EngineEvent>) -> Vec<dnsync_core::EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
