//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`]: Discover the current public address
//! - [`DnsProvider`]: Read and write DNS records via provider APIs

pub mod address_source;
pub mod dns_provider;

pub use address_source::{AddressFamily, AddressSource};
pub use dns_provider::{DnsProvider, ProviderRecord, RECORD_PROXIED, RECORD_TTL};
