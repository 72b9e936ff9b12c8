//! Test doubles and common utilities for contract tests
//!
//! The doubles record every call in shared counters so tests can assert on
//! exactly how the engine talked to its collaborators.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::records::WatchedRecord;
use ddns_core::traits::{AddressFamily, AddressSource, DnsProvider, ProviderRecord};
use ddns_core::{Credentials, DdnsConfig};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// An address source that answers from a fixed script
///
/// Each call consumes one entry; once the script runs out the last entry
/// repeats.
pub struct ScriptedSource {
    label: &'static str,
    family: AddressFamily,
    script: Vec<Option<String>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedSource {
    /// A source that always answers `address`
    pub fn answering(label: &'static str, family: AddressFamily, address: &str) -> Self {
        Self::scripted(label, family, vec![Some(address.to_string())])
    }

    /// A source that always fails
    pub fn failing(label: &'static str, family: AddressFamily) -> Self {
        Self::scripted(label, family, vec![None])
    }

    /// A source following `script`; `None` entries fail
    pub fn scripted(label: &'static str, family: AddressFamily, script: Vec<Option<String>>) -> Self {
        assert!(!script.is_empty(), "script needs at least one entry");
        Self {
            label,
            family,
            script,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle on the call counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

impl fmt::Display for ScriptedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<scripted source; name={}, family={}>", self.label, self.family)
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedSource {
    async fn fetch(&self) -> Result<String> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        let entry = &self.script[call.min(self.script.len() - 1)];

        entry
            .clone()
            .ok_or_else(|| Error::network(format!("{} unavailable", self.label)))
    }

    fn family(&self) -> AddressFamily {
        self.family
    }
}

/// In-memory provider state shared between a mock and the test
#[derive(Default)]
struct ProviderState {
    records: HashMap<(String, AddressFamily), ProviderRecord>,
    updates: Vec<(String, String)>,
    lookup_failures_left: usize,
    update_failures_left: usize,
}

/// A mock DnsProvider backed by an in-memory zone
///
/// Updates change the stored content, so a following cycle sees the new value.
pub struct MockDnsProvider {
    state: Arc<Mutex<ProviderState>>,
    lookup_call_count: Arc<AtomicUsize>,
    update_call_count: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProviderState::default())),
            lookup_call_count: Arc::new(AtomicUsize::new(0)),
            update_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Builder: add a record
    pub fn with_record(self, name: &str, family: AddressFamily, content: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let record_id = format!("id-{}", state.records.len() + 1);
            state.records.insert(
                (name.to_string(), family),
                ProviderRecord {
                    record_id,
                    name: name.to_string(),
                    content: content.to_string(),
                },
            );
        }
        self
    }

    /// Make the next `n` lookups fail
    pub fn fail_lookups(&self, n: usize) {
        self.state.lock().unwrap().lookup_failures_left = n;
    }

    /// Make the next `n` updates fail
    pub fn fail_updates(&self, n: usize) {
        self.state.lock().unwrap().update_failures_left = n;
    }

    /// (name, content) of every successful update, in order
    pub fn updates(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().updates.clone()
    }

    /// Stored content of a record
    pub fn content(&self, name: &str, family: AddressFamily) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(&(name.to_string(), family))
            .map(|r| r.content.clone())
    }

    pub fn lookup_call_count(&self) -> usize {
        self.lookup_call_count.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.update_call_count.load(Ordering::SeqCst)
    }

    /// Create a new MockDnsProvider that shares state and counters with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
            lookup_call_count: Arc::clone(&other.lookup_call_count),
            update_call_count: Arc::clone(&other.update_call_count),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn lookup(&self, name: &str, family: AddressFamily) -> Result<ProviderRecord> {
        self.lookup_call_count.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        if state.lookup_failures_left > 0 {
            state.lookup_failures_left -= 1;
            return Err(Error::network("lookup timed out"));
        }

        state
            .records
            .get(&(name.to_string(), family))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{} ({})", name, family.record_type())))
    }

    async fn update_record(&self, record: &WatchedRecord, value: &str) -> Result<()> {
        self.update_call_count.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        if state.update_failures_left > 0 {
            state.update_failures_left -= 1;
            return Err(Error::provider("mock", "update rejected"));
        }

        let stored = state
            .records
            .get_mut(&(record.name.clone(), record.family))
            .ok_or_else(|| Error::not_found(record.name.clone()))?;
        assert_eq!(stored.record_id, record.record_id, "update must use the resolved record ID");
        stored.content = value.to_string();

        state.updates.push((record.name.clone(), value.to_string()));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A configuration with a token and nothing watched
pub fn base_config() -> DdnsConfig {
    DdnsConfig::new("zone-test", Credentials::ApiToken("token".to_string()))
}

/// Counts warning-level events
struct WarnCounter {
    count: Arc<AtomicUsize>,
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Count warnings logged on this thread while the guard lives
pub fn capture_warnings() -> (tracing::subscriber::DefaultGuard, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter {
        count: Arc::clone(&count),
    });

    (tracing::subscriber::set_default(subscriber), count)
}
