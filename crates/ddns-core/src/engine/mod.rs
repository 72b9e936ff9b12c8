//! Reconciliation engine
//!
//! The ReconcileEngine is responsible for:
//! - Discovering the current public address of each family via the source pool
//! - Reading the current value of every watched record
//! - Updating records whose value differs from the desired one
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ AddressSourcePool│─── current address ──┐
//! └──────────────────┘                      │
//!                                           ▼
//!                                 ┌──────────────────┐
//!                                 │ ReconcileEngine  │
//!                                 └──────────────────┘
//!                                           │
//!         ┌─────────────────────────────────┼──────────────────────────┐
//!         │                                 │                          │
//!         ▼                                 ▼                          ▼
//! ┌───────────────┐               ┌──────────────────┐          ┌─────────────┐
//! │ DnsProvider   │               │ DnsProvider      │          │   Events    │
//! │ (lookup)      │               │ (update)         │          │  (notify)   │
//! └───────────────┘               └──────────────────┘          └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. If any A record is watched, discover the IPv4 address; failure aborts
//!    the whole cycle
//! 2. Reconcile every A record against it
//! 3. If any AAAA record or subnet target is watched, discover the IPv6
//!    address; failure aborts the rest of the cycle
//! 4. Reconcile every AAAA record against it
//! 5. Synthesize each subnet target's address and reconcile it
//!
//! Every I/O step goes through the [`RetryPolicy`]. A step that exhausts its
//! attempts is logged and skipped; the cycle never fails as a whole. Nothing
//! is remembered between cycles: the record values are re-read every time.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

use crate::config::{DdnsConfig, RecordLookup};
use crate::error::Result;
use crate::pool::AddressSourcePool;
use crate::records::{SubnetTarget, WatchedRecord};
use crate::resolver::resolve_address;
use crate::retry::RetryPolicy;
use crate::subnet::{HostSuffix, PrefixLength, synthesize};
use crate::traits::{AddressFamily, DnsProvider};

/// Events emitted by the ReconcileEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A cycle started
    CycleStarted,

    /// The current address of a family was discovered
    AddressDiscovered {
        family: AddressFamily,
        address: String,
    },

    /// Address discovery exhausted its attempts
    DiscoveryFailed {
        family: AddressFamily,
        error: String,
    },

    /// Record already holds the desired value
    RecordUnchanged {
        name: String,
        family: AddressFamily,
        value: String,
    },

    /// Record value differs from the desired value
    AddressChanged {
        name: String,
        family: AddressFamily,
        previous: String,
        current: String,
    },

    /// Record was updated
    UpdateSucceeded {
        name: String,
        family: AddressFamily,
        value: String,
    },

    /// Record was left alone this cycle because a step failed
    RecordSkipped {
        name: String,
        family: AddressFamily,
        reason: String,
    },

    /// A cycle finished
    CycleFinished {
        updated: usize,
        unchanged: usize,
        skipped: usize,
    },
}

/// Outcome of one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records that were updated
    pub updated: Vec<String>,

    /// Records that already held the desired value
    pub unchanged: Vec<String>,

    /// Records skipped after a failed step
    pub skipped: Vec<String>,

    /// Family whose address discovery failed, if any
    ///
    /// Records that would have been processed after it are in none of the
    /// lists above.
    pub aborted: Option<AddressFamily>,
}

impl CycleReport {
    /// Whether every watched record was checked without failure
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.aborted.is_none()
    }
}

/// Core reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`ReconcileEngine::bootstrap()`], which resolves every
///    watched record once
/// 2. Call [`ReconcileEngine::run_cycle()`] once or on a schedule
///
/// The watched record set never changes after bootstrap.
pub struct ReconcileEngine {
    /// DNS provider for reading and updating records
    provider: Box<dyn DnsProvider>,

    /// Address sources, per family
    sources: AddressSourcePool,

    /// Plain A records
    a: Vec<WatchedRecord>,

    /// Plain AAAA records
    aaaa: Vec<WatchedRecord>,

    /// Global prefix length and the targets under it
    subnet: Option<(PrefixLength, Vec<SubnetTarget>)>,

    /// Retry applied to every I/O step
    retry: RetryPolicy,

    /// Where current record values are read from
    lookup: RecordLookup,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl ReconcileEngine {
    /// Validate the configuration and resolve every watched record
    ///
    /// The prefix length and all suffixes are checked before any network
    /// traffic. Each name is then looked up once through the provider to
    /// obtain its record ID.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    ///
    /// # Errors
    ///
    /// Any configuration error, invalid suffix, or record that cannot be
    /// resolved within the retry budget. The engine never starts with a
    /// partially resolved record set.
    pub async fn bootstrap(
        provider: Box<dyn DnsProvider>,
        sources: AddressSourcePool,
        config: &DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let suffixes = match config.subnet_prefix()? {
            Some(prefix) => {
                let parsed = config
                    .subnet_targets()
                    .iter()
                    .map(|t| HostSuffix::parse(prefix, &t.suffix).map(|s| (t.domain.as_str(), s)))
                    .collect::<Result<Vec<_>>>()?;
                Some((prefix, parsed))
            }
            None => None,
        };

        let retry = RetryPolicy::from(&config.engine);

        let mut a = Vec::with_capacity(config.a.len());
        for name in &config.a {
            a.push(resolve_record(provider.as_ref(), &retry, name, AddressFamily::V4).await?);
        }

        let mut aaaa = Vec::with_capacity(config.aaaa.len());
        for name in &config.aaaa {
            aaaa.push(resolve_record(provider.as_ref(), &retry, name, AddressFamily::V6).await?);
        }

        let subnet = match suffixes {
            Some((prefix, parsed)) => {
                let mut targets = Vec::with_capacity(parsed.len());
                for (domain, suffix) in parsed {
                    let record = resolve_record(provider.as_ref(), &retry, domain, AddressFamily::V6).await?;
                    targets.push(SubnetTarget { suffix, record });
                }
                Some((prefix, targets))
            }
            None => None,
        };

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            provider,
            sources,
            a,
            aaaa,
            subnet,
            retry,
            lookup: config.engine.lookup,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Watched records of one family, subnet targets included for IPv6
    pub fn watched(&self, family: AddressFamily) -> Vec<&WatchedRecord> {
        match family {
            AddressFamily::V4 => self.a.iter().collect(),
            AddressFamily::V6 => self
                .aaaa
                .iter()
                .chain(self.subnet_targets().iter().map(|t| &t.record))
                .collect(),
        }
    }

    /// Subnet targets (empty without a subnet section)
    pub fn subnet_targets(&self) -> &[SubnetTarget] {
        self.subnet.as_ref().map(|(_, t)| t.as_slice()).unwrap_or(&[])
    }

    /// Run one full check cycle
    ///
    /// Never fails: every error is logged, retried, and on exhaustion
    /// turned into a skip recorded in the returned report.
    pub async fn run_cycle(&self) -> CycleReport {
        self.emit_event(EngineEvent::CycleStarted);
        let mut report = CycleReport::default();

        self.reconcile_cycle(&mut report).await;

        info!(
            "Check finished: {} updated, {} unchanged, {} skipped",
            report.updated.len(),
            report.unchanged.len(),
            report.skipped.len()
        );
        self.emit_event(EngineEvent::CycleFinished {
            updated: report.updated.len(),
            unchanged: report.unchanged.len(),
            skipped: report.skipped.len(),
        });

        report
    }

    async fn reconcile_cycle(&self, report: &mut CycleReport) {
        if !self.a.is_empty() {
            let Some(current) = self.discover(AddressFamily::V4).await else {
                report.aborted = Some(AddressFamily::V4);
                return;
            };

            for record in &self.a {
                self.reconcile(record, &current, report).await;
            }
        }

        if self.aaaa.is_empty() && self.subnet_targets().is_empty() {
            return;
        }

        let Some(current) = self.discover(AddressFamily::V6).await else {
            report.aborted = Some(AddressFamily::V6);
            return;
        };

        for record in &self.aaaa {
            self.reconcile(record, &current, report).await;
        }

        if let Some((prefix, targets)) = &self.subnet {
            for target in targets {
                match synthesize(&current, *prefix, &target.suffix) {
                    Ok(address) => {
                        self.reconcile(&target.record, &address.to_string(), report).await;
                    }
                    Err(e) => {
                        warn!(
                            "Failed to build address of {} from {} and suffix {}: {}",
                            target.domain(),
                            current,
                            target.suffix,
                            e
                        );
                        self.skip(&target.record, e.to_string(), report);
                    }
                }
            }
        }
    }

    /// Discover the current address of `family`
    ///
    /// `None` when every attempt failed.
    async fn discover(&self, family: AddressFamily) -> Option<String> {
        let operation = format!("get current {} address", family);

        match self.retry.run(&operation, || self.sources.fetch_first(family)).await {
            Ok(address) => {
                info!("Current {} address: {}", family, address);
                self.emit_event(EngineEvent::AddressDiscovered {
                    family,
                    address: address.clone(),
                });
                Some(address)
            }
            Err(e) => {
                error!("Skipping {} records this cycle: {}", family, e);
                self.emit_event(EngineEvent::DiscoveryFailed {
                    family,
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Bring one record to `desired` if it holds anything else
    async fn reconcile(&self, record: &WatchedRecord, desired: &str, report: &mut CycleReport) {
        let operation = format!("get current value of {}", record);
        let current = match self.retry.run(&operation, || self.current_value(record)).await {
            Ok(current) => current,
            Err(e) => {
                self.skip(record, e.to_string(), report);
                return;
            }
        };

        // Values are compared as text, exactly as returned
        if current == desired {
            debug!("{} is up to date ({})", record, current);
            self.emit_event(EngineEvent::RecordUnchanged {
                name: record.name.clone(),
                family: record.family,
                value: current,
            });
            report.unchanged.push(record.name.clone());
            return;
        }

        info!("{} changed: {} -> {}", record, current, desired);
        self.emit_event(EngineEvent::AddressChanged {
            name: record.name.clone(),
            family: record.family,
            previous: current,
            current: desired.to_string(),
        });

        let operation = format!("update {}", record);
        match self
            .retry
            .run(&operation, || self.provider.update_record(record, desired))
            .await
        {
            Ok(()) => {
                info!("Updated {} to {}", record, desired);
                self.emit_event(EngineEvent::UpdateSucceeded {
                    name: record.name.clone(),
                    family: record.family,
                    value: desired.to_string(),
                });
                report.updated.push(record.name.clone());
            }
            Err(e) => self.skip(record, e.to_string(), report),
        }
    }

    /// Read the current value of a record from the configured place
    async fn current_value(&self, record: &WatchedRecord) -> Result<String> {
        match self.lookup {
            RecordLookup::Provider => self
                .provider
                .lookup(&record.name, record.family)
                .await
                .map(|found| found.content),
            RecordLookup::Dns => resolve_address(&record.name, record.family).await,
        }
    }

    fn skip(&self, record: &WatchedRecord, reason: String, report: &mut CycleReport) {
        error!("Skipping {}: {}", record, reason);
        self.emit_event(EngineEvent::RecordSkipped {
            name: record.name.clone(),
            family: record.family,
            reason,
        });
        report.skipped.push(record.name.clone());
    }

    /// Emit an engine event
    ///
    /// Dropped with a warning when the channel is full and silently when
    /// nobody listens.
    fn emit_event(&self, event: EngineEvent) {
        if let Err(TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Resolve one configured name to a watched record
async fn resolve_record(
    provider: &dyn DnsProvider,
    retry: &RetryPolicy,
    name: &str,
    family: AddressFamily,
) -> Result<WatchedRecord> {
    let operation = format!("find {} record of {}", family.record_type(), name);
    let found = retry.run(&operation, || provider.lookup(name, family)).await?;

    let record = WatchedRecord::new(name, found.record_id, family);
    info!("Watch domain {}", record);
    Ok(record)
}
