//! Record values read through the system resolver
//!
//! Used when the engine is configured with `lookup = "dns"`: the current
//! value of a record is whatever the local resolver answers for its name,
//! which may lag behind the provider because of caching.

use tokio::net::lookup_host;

use crate::config::DEFAULT_HTTP_TIMEOUT;
use crate::error::{Error, Result};
use crate::traits::AddressFamily;

/// Resolve `name` and return the first address of `family` as text
///
/// # Errors
///
/// - `Error::Network`: The resolver failed or timed out
/// - `Error::NotFound`: The name has no address of that family
pub async fn resolve_address(name: &str, family: AddressFamily) -> Result<String> {
    let addrs = tokio::time::timeout(DEFAULT_HTTP_TIMEOUT, lookup_host((name, 0)))
        .await
        .map_err(|_| Error::network(format!("resolving {} timed out", name)))?
        .map_err(|e| Error::network(format!("resolving {}: {}", name, e)))?;

    addrs
        .map(|addr| addr.ip())
        .find(|ip| family.matches(ip))
        .map(|ip| ip.to_string())
        .ok_or_else(|| Error::not_found(format!("{} has no {} record", name, family.record_type())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_literal_address_resolves_to_itself() {
        let v4 = assert_ok!(resolve_address("198.51.100.7", AddressFamily::V4).await);
        assert_eq!(v4, "198.51.100.7");

        let v6 = assert_ok!(resolve_address("2001:db8::10", AddressFamily::V6).await);
        assert_eq!(v6, "2001:db8::10");
    }

    #[tokio::test]
    async fn test_family_mismatch_is_not_found() {
        let err = resolve_address("198.51.100.7", AddressFamily::V6).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
