// # Address Source Trait
//
// Defines the interface for discovering the machine's current public address.
//
// ## Implementations
//
// - HTTP body / trace endpoints: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::AddressSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* AddressSource implementation */;
//
//     let current = source.fetch().await?;
//     println!("{} says we are {}", source, current);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

/// Address family (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// DNS record type carrying addresses of this family
    pub fn record_type(self) -> &'static str {
        match self {
            AddressFamily::V4 => "A",
            AddressFamily::V6 => "AAAA",
        }
    }

    /// Whether `ip` belongs to this family
    pub fn matches(self, ip: &IpAddr) -> bool {
        match self {
            AddressFamily::V4 => ip.is_ipv4(),
            AddressFamily::V6 => ip.is_ipv6(),
        }
    }

    /// Family of a parsed address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("ipv4"),
            AddressFamily::V6 => f.write_str("ipv6"),
        }
    }
}

/// Trait for public address sources
///
/// A source answers one question: "what public address does the outside
/// world see for this family right now?". It performs a single request per
/// call.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform outbound HTTP(S) requests to its own endpoint
/// - ✅ Parse the endpoint's response
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry or fallback logic (owned by `AddressSourcePool` and `RetryPolicy`)
/// - ❌ Cache results between calls (every cycle recomputes from scratch)
/// - ❌ Perform DNS updates (use `DnsProvider`)
///
/// The `Display` impl describes the source for log lines.
#[async_trait]
pub trait AddressSource: Send + Sync + fmt::Display {
    /// Fetch the current address as text
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address, trimmed, exactly as the endpoint reported it
    /// - `Err(Error::Network)`: Transport failure, timeout, or non-success status
    /// - `Err(Error::Parse)`: The body did not contain an address of this family
    async fn fetch(&self) -> Result<String, crate::Error>;

    /// The address family this source reports
    fn family(&self) -> AddressFamily;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_types() {
        assert_eq!(AddressFamily::V4.record_type(), "A");
        assert_eq!(AddressFamily::V6.record_type(), "AAAA");
    }

    #[test]
    fn test_family_matching() {
        let v4: IpAddr = "203.0.113.5".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert!(AddressFamily::V4.matches(&v4));
        assert!(!AddressFamily::V4.matches(&v6));
        assert_eq!(AddressFamily::of(&v6), AddressFamily::V6);
    }
}
