//! Reconciliation engine
//!
//! The SyncEngine is responsible for:
//! - Registering with the resource registry at startup
//! - Checking single records when the registry reports a change
//! - Running full reconciliation passes on a fixed interval
//! - Giving up the provider role on terminate
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ EventSource │─── Event ───────────┐
//! └─────────────┘                     │
//!  interval tick ─────────────────────┤
//!                                     ▼
//!                            ┌──────────────┐
//!                            │  SyncEngine  │
//!                            └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌─────────────┐           ┌──────────────┐           ┌─────────────┐
//! │  Registry   │           │ DnsProvider  │           │   Events    │
//! │ (desired)   │           │ (observed)   │           │  (notify)   │
//! └─────────────┘           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Event Flow
//!
//! 1. `ResourceChanged`: normalize the record, fetch it from the provider,
//!    create or update it when missing or different
//! 2. `PeriodicTick` (or the interval timer): fetch both full sets, diff,
//!    apply every change in change-set order
//! 3. `Terminate` or a shutdown signal: deregister and stop
//!
//! Events are handled one at a time to completion. A pass in flight is
//! never cancelled; shutdown is only observed between events.

pub mod apply;
mod context;
mod startup;

pub use apply::apply;
pub use context::SyncContext;

use crate::compare::equal;
use crate::config::EngineConfig;
use crate::diff::{Action, ChangeKey, ChangeSetEntry, DiffKeying, diff};
use crate::error::{Error, Result};
use crate::record::{CanonicalRecord, Resource, normalize};
use crate::traits::{DnsProvider, Event, EventSource, ResourceRegistry};
use chrono::{DateTime, Utc};
use std::ops::ControlFlow;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started its event loop
    Started {
        domain: String,
        interval_secs: u64,
    },

    /// A full pass computed its change-set and starts applying it
    PassStarted {
        desired: usize,
        observed: usize,
        changes: usize,
    },

    /// A change was applied and reported
    ActionApplied {
        key: ChangeKey,
        action: Action,
    },

    /// A change failed; siblings are unaffected
    ActionFailed {
        key: ChangeKey,
        action: Action,
        error: String,
    },

    /// A full pass could not fetch its inputs; nothing was mutated
    PassAbandoned {
        error: String,
    },

    /// A full pass finished
    PassCompleted {
        applied: usize,
        failed: usize,
    },

    /// An event was discarded without action
    EventDropped {
        reason: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of applying one change-set entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Change-set key the entry was stored under
    pub key: ChangeKey,
    /// What was attempted
    pub action: Action,
    /// The record sent to the provider
    pub record: CanonicalRecord,
    /// Failure message, `None` when the action succeeded
    pub error: Option<String>,
}

impl ActionOutcome {
    /// True when the provider call and the status report both succeeded
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one full reconciliation pass
#[derive(Debug, Clone)]
pub struct PassReport {
    /// When the desired set was fetched
    pub started_at: DateTime<Utc>,
    /// When the last action returned
    pub finished_at: DateTime<Utc>,
    /// One outcome per change-set entry, in change-set order
    pub outcomes: Vec<ActionOutcome>,
}

impl PassReport {
    /// Number of actions that succeeded
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of actions that failed
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.applied()
    }

    /// True when the pass found nothing to change
    pub fn is_noop(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Wall-clock time the pass took
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::connect()`] (runs the startup sequence) or
///    [`SyncEngine::new()`] (context already built)
/// 2. Start with [`SyncEngine::run()`]
/// 3. Engine runs until a terminate event or shutdown signal
///
/// ## Load Resistance
///
/// Engine events go to a bounded channel. When the consumer lags, new
/// events are dropped with a warning instead of growing memory.
pub struct SyncEngine {
    /// Provider, registry and managed domain
    ctx: SyncContext,

    /// External trigger feed
    events: Box<dyn EventSource>,

    /// Seconds between full passes
    interval_secs: u64,

    /// Change-set keying for full passes
    keying: DiffKeying,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl SyncEngine {
    /// Create an engine around an already-built context
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ctx: SyncContext,
        events: Box<dyn EventSource>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            ctx,
            events,
            interval_secs: config.interval_secs,
            keying: config.diff_keying,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the startup sequence, then create the engine
    ///
    /// Registration as provider, the managed domain lookup and the provider
    /// domain check happen here. Any fatal failure deregisters (best effort)
    /// and returns the error.
    pub async fn connect(
        provider: Box<dyn DnsProvider>,
        registry: Box<dyn ResourceRegistry>,
        events: Box<dyn EventSource>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let ctx = startup::connect(provider, registry, &config).await?;
        Self::new(ctx, events, config)
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// Run the engine until a terminate event, SIGINT or SIGTERM
    ///
    /// The first full pass starts immediately.
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine with a programmatic shutdown signal
    ///
    /// Used by tests and embedders that own signal handling. Dropping the
    /// sender also stops the engine.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                    Ok("shutdown signal")
                }
                None => wait_for_signal().await,
            }
        };
        self.run_until(shutdown).await
    }

    /// Run the engine until `shutdown` resolves or a terminate event arrives
    ///
    /// The future yields the name of the signal that stopped the engine. If it
    /// resolves to an error the engine still deregisters and emits
    /// `Stopped` before returning that error.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<&'static str>>,
    {
        self.emit_event(EngineEvent::Started {
            domain: self.ctx.domain().to_string(),
            interval_secs: self.interval_secs,
        });
        info!(
            "Engine started for domain '{}', full pass every {}s",
            self.ctx.domain(),
            self.interval_secs
        );

        let mut events = self.events.watch();
        let mut events_open = true;

        let mut ticker = interval(Duration::from_secs(self.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        let reason = loop {
            tokio::select! {
                signal = &mut shutdown => match signal {
                    Ok(signal) => {
                        info!("Received {}", signal);
                        self.on_terminate().await;
                        break signal.to_string();
                    }
                    Err(e) => {
                        error!("Shutdown signal failed: {}", e);
                        self.on_terminate().await;
                        self.emit_event(EngineEvent::Stopped {
                            reason: format!("shutdown signal failed: {}", e),
                        });
                        return Err(e);
                    }
                },

                next = events.next(), if events_open => match next {
                    Some(event) => {
                        if self.dispatch(event).await.is_break() {
                            break "terminate event".to_string();
                        }
                    }
                    None => {
                        warn!("Event source closed, continuing with periodic passes only");
                        events_open = false;
                    }
                },

                _ = ticker.tick() => {
                    self.on_periodic_timer().await;
                }
            }
        };

        self.emit_event(EngineEvent::Stopped { reason });
        info!("Engine stopped");

        Ok(())
    }

    /// Route one event to its handler
    ///
    /// Returns `Break` when the engine should stop.
    pub async fn dispatch(&self, event: Event) -> ControlFlow<()> {
        match event {
            Event::ResourceChanged(resource) => {
                self.on_resource_event(&resource).await;
                ControlFlow::Continue(())
            }
            Event::PeriodicTick => {
                self.on_periodic_timer().await;
                ControlFlow::Continue(())
            }
            Event::Terminate => {
                info!("Terminate requested by registry");
                self.on_terminate().await;
                ControlFlow::Break(())
            }
        }
    }

    /// Check a single changed resource against the provider and fix it
    ///
    /// # Returns
    ///
    /// - `Some(ActionOutcome)`: A create or update was attempted
    /// - `None`: Nothing to do, or the event was dropped
    pub async fn on_resource_event(&self, resource: &Resource) -> Option<ActionOutcome> {
        let Some(desired) = resource.as_dns() else {
            warn!(
                resource_id = %resource.id,
                "Ignoring resource of type '{}'",
                resource.kind()
            );
            self.emit_event(EngineEvent::EventDropped {
                reason: format!("resource {} is not a DNS record", resource.id),
            });
            return None;
        };

        let record = normalize(desired, self.ctx.domain());
        let provider = self.ctx.provider();

        let entry = match provider
            .get_record(self.ctx.domain(), &record.name, &record.record_type)
            .await
        {
            Ok(observed) if equal(&record, &observed) => {
                debug!(resource_id = %resource.id, "Records are the same, nothing to do: {}", record);
                return None;
            }
            Ok(observed) => {
                debug!(resource_id = %resource.id, "Record differs: {} -> {}", observed, record);
                ChangeSetEntry::update(record)
            }
            Err(e) if e.is_not_found() => ChangeSetEntry::create(record),
            Err(e) => {
                error!(
                    resource_id = %resource.id,
                    "Failed to retrieve record {}({}): {}",
                    record.name, record.record_type, e
                );
                self.emit_event(EngineEvent::EventDropped {
                    reason: format!("lookup failed for resource {}: {}", resource.id, e),
                });
                return None;
            }
        };

        let key = self.keying.key_for(&entry.record);
        Some(self.execute(key, &entry).await)
    }

    /// Run one full reconciliation pass
    ///
    /// Fails without mutating anything when either full set cannot be
    /// fetched. Individual action failures are recorded in the report.
    pub async fn reconcile_all(&self) -> Result<PassReport> {
        let started_at = Utc::now();

        let resources = self
            .ctx
            .registry()
            .list_resources()
            .await
            .map_err(|e| Error::registry(format!("Failed to retrieve resources: {}", e)))?;

        let desired: Vec<CanonicalRecord> = resources
            .iter()
            .filter_map(|resource| resource.as_dns())
            .map(|record| normalize(record, self.ctx.domain()))
            .collect();

        let provider = self.ctx.provider();
        let observed = provider.list_records(self.ctx.domain()).await.map_err(|e| {
            Error::provider(
                provider.provider_name(),
                format!("Failed to retrieve records for {}: {}", self.ctx.domain(), e),
            )
        })?;

        let changes = diff(&desired, &observed, self.keying);

        self.emit_event(EngineEvent::PassStarted {
            desired: desired.len(),
            observed: observed.len(),
            changes: changes.len(),
        });

        if changes.is_empty() {
            info!("Records are the same, nothing to do");
        } else {
            info!(
                "Applying {} change(s): {} create, {} update, {} delete",
                changes.len(),
                changes.count(Action::Create),
                changes.count(Action::Update),
                changes.count(Action::Delete)
            );
        }

        let mut outcomes = Vec::with_capacity(changes.len());
        for (key, entry) in changes.iter() {
            outcomes.push(self.execute(key.clone(), entry).await);
        }

        let report = PassReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        self.emit_event(EngineEvent::PassCompleted {
            applied: report.applied(),
            failed: report.failed(),
        });

        Ok(report)
    }

    /// Full pass triggered by the timer or a tick event
    ///
    /// Errors abandon the pass; the next tick retries from scratch.
    pub async fn on_periodic_timer(&self) -> Option<PassReport> {
        match self.reconcile_all().await {
            Ok(report) => {
                debug!(
                    "Pass finished in {}ms: {} applied, {} failed",
                    report.duration().num_milliseconds(),
                    report.applied(),
                    report.failed()
                );
                Some(report)
            }
            Err(e) => {
                error!("Reconciliation pass abandoned: {}", e);
                self.emit_event(EngineEvent::PassAbandoned {
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Give up the provider role; errors are logged only
    pub async fn on_terminate(&self) {
        startup::deregister(self.ctx.registry(), self.ctx.provider_role()).await;
    }

    async fn execute(&self, key: ChangeKey, entry: &ChangeSetEntry) -> ActionOutcome {
        let origin = entry.record.origin_id.as_deref().unwrap_or("-");

        let error = match apply(&self.ctx, entry).await {
            Ok(()) => {
                info!(resource_id = origin, "{} {}", entry.action, entry.record);
                self.emit_event(EngineEvent::ActionApplied {
                    key: key.clone(),
                    action: entry.action,
                });
                None
            }
            Err(e) => {
                error!(resource_id = origin, "{} {} failed: {}", entry.action, entry.record, e);
                self.emit_event(EngineEvent::ActionFailed {
                    key: key.clone(),
                    action: entry.action,
                    error: e.to_string(),
                });
                Some(e.to_string())
            }
        };

        ActionOutcome {
            key,
            action: entry.action,
            record: entry.record.clone(),
            error,
        }
    }

    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Other(format!("Failed to setup SIGTERM handler: {}", e)))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Other(format!("Failed to setup SIGINT handler: {}", e)))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::Other(format!("Failed to wait for CTRL-C: {}", e)))?;
    Ok("SIGINT")
}
