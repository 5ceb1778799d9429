//! Polling event source
//!
//! Polls the resource list at a fixed interval and emits
//! `ResourceChanged` for every DNS resource that is new or differs from the
//! previous poll. The first poll only records a baseline, since the engine
//! starts with a full pass anyway. Removals emit nothing; the periodic pass
//! deletes stale records.

use crate::client::ProtosRegistry;
use dnsync_core::record::{DesiredRecord, Resource};
use dnsync_core::traits::{Event, EventSource, ResourceRegistry};
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Remembers the last seen DNS resources between polls
#[derive(Debug, Default)]
pub struct ChangeTracker {
    seen: HashMap<String, DesiredRecord>,
    primed: bool,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a poll result and return events for new or changed resources
    pub fn observe(&mut self, resources: Vec<Resource>) -> Vec<Event> {
        let mut current = HashMap::with_capacity(resources.len());
        let mut events = Vec::new();

        for resource in resources {
            let Some(record) = resource.as_dns() else {
                continue;
            };

            if self.primed && self.seen.get(&resource.id) != Some(record) {
                events.push(Event::ResourceChanged(resource.clone()));
            }
            current.insert(resource.id.clone(), record.clone());
        }

        self.seen = current;
        self.primed = true;
        events
    }
}

/// Event source backed by polling the Protos resource list
pub struct ProtosEventSource {
    registry: ProtosRegistry,
    poll_interval: Duration,
}

impl ProtosEventSource {
    pub fn new(registry: ProtosRegistry, poll_interval: Duration) -> Self {
        Self {
            registry,
            poll_interval,
        }
    }
}

impl EventSource for ProtosEventSource {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = Event> + Send + 'static>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        let registry = self.registry.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            tracing::info!("Watching Protos resources (interval={:?})", poll_interval);

            let mut tracker = ChangeTracker::new();
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {}
                }

                let resources = match registry.list_resources().await {
                    Ok(resources) => resources,
                    Err(e) => {
                        tracing::warn!("Failed to poll Protos resources: {}", e);
                        continue;
                    }
                };

                for event in tracker.observe(resources) {
                    if tx.send(event).is_err() {
                        tracing::debug!("Receiver dropped, stopping resource watch");
                        return;
                    }
                }
            }

            tracing::debug!("Resource watch stopped");
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}
