//! Ordered address sources with fallback
//!
//! Sources are tried one at a time, in the order they were added. The first
//! success wins and the remaining sources are not contacted for that call.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::traits::{AddressFamily, AddressSource};

/// Per-family lists of address sources
#[derive(Default)]
pub struct AddressSourcePool {
    v4: Vec<Box<dyn AddressSource>>,
    v6: Vec<Box<dyn AddressSource>>,
}

impl AddressSourcePool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source to the list of its family
    pub fn push(&mut self, source: Box<dyn AddressSource>) {
        match source.family() {
            AddressFamily::V4 => self.v4.push(source),
            AddressFamily::V6 => self.v6.push(source),
        }
    }

    /// Builder-style [`push`](Self::push)
    pub fn with_source(mut self, source: Box<dyn AddressSource>) -> Self {
        self.push(source);
        self
    }

    /// Sources for one family, in trial order
    pub fn sources(&self, family: AddressFamily) -> &[Box<dyn AddressSource>] {
        match family {
            AddressFamily::V4 => &self.v4,
            AddressFamily::V6 => &self.v6,
        }
    }

    /// Number of sources for one family
    pub fn len(&self, family: AddressFamily) -> usize {
        self.sources(family).len()
    }

    /// Ask each source of `family` in turn until one answers
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The first successful answer
    /// - `Err(Error::Config)`: No source is configured for the family
    /// - `Err(_)`: Every source failed; the last source's error
    pub async fn fetch_first(&self, family: AddressFamily) -> Result<String> {
        let mut last_error = None;

        for source in self.sources(family) {
            match source.fetch().await {
                Ok(address) => {
                    debug!("{} answered {}", source, address);
                    return Ok(address);
                }
                Err(e) => {
                    warn!("Failed to get current IP by using {}: {}", source, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::config(format!("no {} address sources configured", family))
        }))
    }
}

impl std::fmt::Debug for AddressSourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let describe = |sources: &[Box<dyn AddressSource>]| {
            sources.iter().map(|s| s.to_string()).collect::<Vec<_>>()
        };
        f.debug_struct("AddressSourcePool")
            .field("v4", &describe(&self.v4))
            .field("v6", &describe(&self.v6))
            .finish()
    }
}
