//! Records watched by the engine
//!
//! Both types are created once during startup resolution and never change
//! afterwards.

use std::fmt;

use crate::subnet::HostSuffix;
use crate::traits::AddressFamily;

/// A DNS record resolved to its provider-side identifier
///
/// Identity is `(name, family)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedRecord {
    /// The record name
    pub name: String,
    /// Provider-side record ID
    pub record_id: String,
    /// A or AAAA
    pub family: AddressFamily,
}

impl WatchedRecord {
    /// Create a watched record
    pub fn new(name: impl Into<String>, record_id: impl Into<String>, family: AddressFamily) -> Self {
        Self {
            name: name.into(),
            record_id: record_id.into(),
            family,
        }
    }

    /// "A" or "AAAA"
    pub fn record_type(&self) -> &'static str {
        self.family.record_type()
    }
}

impl fmt::Display for WatchedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.record_type())
    }
}

/// An AAAA record whose address is synthesized from the discovered prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetTarget {
    /// Host suffix validated against the global prefix length
    pub suffix: HostSuffix,
    /// The AAAA record of the target domain
    pub record: WatchedRecord,
}

impl SubnetTarget {
    /// The target's domain
    pub fn domain(&self) -> &str {
        &self.record.name
    }
}
