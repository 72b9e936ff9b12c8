// # DNS Provider Trait
//
// Defines the two provider operations the engine needs: read a record and
// write a record.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressFamily, DnsProvider};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let found = provider.lookup("home.example.com", AddressFamily::V4).await?;
//     let record = WatchedRecord::new("home.example.com", found.record_id, AddressFamily::V4);
//     provider.update_record(&record, "198.51.100.2").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::records::WatchedRecord;
use crate::traits::AddressFamily;

/// TTL sent with every record update, in seconds
pub const RECORD_TTL: u32 = 60;

/// Proxying flag sent with every record update
pub const RECORD_PROXIED: bool = false;

/// A record as the provider currently stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRecord {
    /// The record ID (provider-specific)
    pub record_id: String,
    /// The record name
    pub name: String,
    /// The record content, verbatim
    pub content: String,
}

/// Trait for DNS provider implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (engine handles retry)
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (owned by `RetryPolicy`)
/// - ❌ Decide whether an update is needed (owned by `ReconcileEngine`)
/// - ❌ Cache state beyond a single request
/// - ❌ Spawn tasks or threads
///
/// ## Why No Retry Logic?
///
/// Every error kind is retried identically by the engine, up to its attempt
/// cap. A provider that retries on its own multiplies that cap and hides
/// attempts from the logs.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up the record `name` of the family's record type
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderRecord)`: The first record whose name equals `name`
    /// - `Err(Error::NotFound)`: No record matches
    /// - `Err(Error::Provider)`: The provider reported failure
    async fn lookup(
        &self,
        name: &str,
        family: AddressFamily,
    ) -> Result<ProviderRecord, crate::Error>;

    /// Overwrite the record's content with `value`
    ///
    /// Implementations send [`RECORD_TTL`] and [`RECORD_PROXIED`] with every
    /// update.
    async fn update_record(
        &self,
        record: &WatchedRecord,
        value: &str,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
