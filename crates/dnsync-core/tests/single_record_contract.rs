//! Contract Test: Single-Record Path
//!
//! A resource-changed event checks one record against the provider:
//! - Not found at the provider → create
//! - Different → update
//! - Equal → nothing
//! - Any other lookup error → logged and dropped, no mutation

mod common;

use common::*;
use dnsync_core::traits::{Event, ResourceStatus};
use dnsync_core::{Action, EngineEvent, Resource};
use std::ops::ControlFlow;

#[tokio::test]
async fn not_found_triggers_create() {
    let provider = MemoryProvider::new();
    let registry = MemoryRegistry::new(Vec::new());
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    let outcome = engine
        .on_resource_event(&dns_resource("r1", "www", "A", 300, "1.1.1.1"))
        .await
        .expect("an action was attempted");

    assert_eq!(outcome.action, Action::Create);
    assert!(outcome.is_success());
    assert_eq!(provider.calls(), vec!["create www/A"]);
    assert_eq!(registry.statuses(), vec![("r1".to_string(), ResourceStatus::Created)]);
}

#[tokio::test]
async fn differing_record_is_updated() {
    let provider = MemoryProvider::with_records(vec![observed("www", "A", 300, "1.1.1.1")]);
    let registry = MemoryRegistry::new(Vec::new());
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    let outcome = engine
        .on_resource_event(&dns_resource("r1", "www", "A", 600, "1.1.1.1"))
        .await
        .expect("an action was attempted");

    assert_eq!(outcome.action, Action::Update);
    assert_eq!(provider.find("www", "A").map(|r| r.ttl), Some(600));
    assert_eq!(registry.reported_ids(), vec!["r1".to_string()]);
}

#[tokio::test]
async fn equal_record_is_left_alone() {
    let provider = MemoryProvider::with_records(vec![observed("mail", "MX", 300, "10 mx.example.com.")]);
    let registry = MemoryRegistry::new(Vec::new());
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    let outcome = engine
        .on_resource_event(&dns_resource("r1", "mail", "mx", 300, "mx.example.com"))
        .await;

    assert!(outcome.is_none());
    assert_eq!(provider.mutation_count(), 0);
    assert!(registry.statuses().is_empty());
}

#[tokio::test]
async fn lookup_failure_is_dropped_without_mutation() {
    let provider = MemoryProvider::new();
    provider.set_fail_lookup(true);
    let registry = MemoryRegistry::new(Vec::new());
    let (engine, mut rx, _tx) = build_engine(&provider, &registry);

    let outcome = engine
        .on_resource_event(&dns_resource("r1", "www", "A", 300, "1.1.1.1"))
        .await;

    assert!(outcome.is_none());
    assert_eq!(provider.mutation_count(), 0);
    assert!(
        drain(&mut rx)
            .iter()
            .any(|e| matches!(e, EngineEvent::EventDropped { .. }))
    );
}

#[tokio::test]
async fn failed_create_is_reported_in_outcome_only() {
    let provider = MemoryProvider::new();
    provider.fail_mutations_for("www");
    let registry = MemoryRegistry::new(Vec::new());
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    let outcome = engine
        .on_resource_event(&dns_resource("r1", "www", "A", 300, "1.1.1.1"))
        .await
        .expect("an action was attempted");

    assert!(!outcome.is_success());
    assert!(registry.statuses().is_empty());
}

#[tokio::test]
async fn non_dns_resource_is_dropped() {
    let provider = MemoryProvider::new();
    let registry = MemoryRegistry::new(Vec::new());
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    assert!(engine.on_resource_event(&Resource::other("v1", "volume")).await.is_none());
    assert_eq!(provider.mutation_count(), 0);
}

#[tokio::test]
async fn dispatch_routes_resource_events_and_continues() {
    let provider = MemoryProvider::new();
    let registry = MemoryRegistry::new(Vec::new());
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    let flow = engine
        .dispatch(Event::ResourceChanged(dns_resource("r1", "www", "A", 300, "1.1.1.1")))
        .await;

    assert_eq!(flow, ControlFlow::Continue(()));
    assert_eq!(provider.calls(), vec!["create www/A"]);
    // The single-record path never lists the zone
    assert_eq!(provider.list_call_count(), 0);
}
