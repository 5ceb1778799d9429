//! Contract Test: Convergence & Idempotency
//!
//! Constraints verified:
//! - A second pass over an unchanged registry mutates nothing
//! - Normalization never accumulates (MX priority is added once)
//! - Name-and-type keying keeps records sharing a name apart

mod common;

use common::*;
use dnsync_core::config::EngineConfig;
use dnsync_core::{DiffKeying, SyncContext, SyncEngine};
use tokio_test::assert_ok;

#[tokio::test]
async fn second_pass_is_a_noop() {
    let provider = MemoryProvider::with_records(vec![
        observed("old", "A", 300, "9.9.9.9"),
        observed("www", "A", 300, "8.8.8.8"),
    ]);
    let registry = MemoryRegistry::new(vec![
        dns_resource("r1", "@", "A", 300, "1.2.3.4"),
        dns_resource("r2", "mail", "MX", 300, "mx.example.com"),
        dns_resource("r3", "www", "A", 300, "1.1.1.1"),
    ]);
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    let first = assert_ok!(engine.reconcile_all().await);
    assert_eq!(first.applied(), 4);

    let mutations = provider.mutation_count();
    let second = assert_ok!(engine.reconcile_all().await);

    assert!(second.is_noop(), "unexpected changes: {:?}", second.outcomes);
    assert_eq!(provider.mutation_count(), mutations);
}

#[tokio::test]
async fn repeated_passes_do_not_double_prefix_mx() {
    let provider = MemoryProvider::new();
    let registry =
        MemoryRegistry::new(vec![dns_resource("r1", "mail", "MX", 300, "mx.example.com")]);
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    for _ in 0..3 {
        assert_ok!(engine.reconcile_all().await);
    }

    assert_eq!(provider.calls(), vec!["create mail/MX"]);
    assert_eq!(
        provider.find("mail", "MX").map(|r| r.values),
        Some(vec!["10 mx.example.com".to_string()])
    );
}

#[tokio::test]
async fn single_record_then_full_pass_converges() {
    let provider = MemoryProvider::new();
    let registry = MemoryRegistry::new(vec![dns_resource("r1", "www", "A", 300, "1.1.1.1")]);
    let (engine, _rx, _tx) = build_engine(&provider, &registry);

    engine
        .on_resource_event(&dns_resource("r1", "www", "A", 300, "1.1.1.1"))
        .await
        .expect("record created");

    let report = assert_ok!(engine.reconcile_all().await);
    assert!(report.is_noop());
}

#[tokio::test]
async fn name_and_type_keying_keeps_shared_names_apart() {
    let provider = MemoryProvider::new();
    let registry = MemoryRegistry::new(vec![
        dns_resource("r1", "www", "A", 300, "1.1.1.1"),
        dns_resource("r2", "www", "AAAA", 300, "::1"),
    ]);

    let ctx = SyncContext::new(
        Box::new(MemoryProvider::sharing_state_with(&provider)),
        Box::new(MemoryRegistry::sharing_state_with(&registry)),
        DOMAIN,
        "dns",
    );
    let (source, _tx) = ControlledEventSource::new();
    let config = EngineConfig {
        diff_keying: DiffKeying::NameAndType,
        ..test_engine_config()
    };
    let (engine, _rx) = assert_ok!(SyncEngine::new(ctx, Box::new(source), config));

    let first = assert_ok!(engine.reconcile_all().await);
    assert_eq!(first.applied(), 2);
    assert!(provider.find("www", "A").is_some());
    assert!(provider.find("www", "AAAA").is_some());

    let second = assert_ok!(engine.reconcile_all().await);
    assert!(second.is_noop());
}
