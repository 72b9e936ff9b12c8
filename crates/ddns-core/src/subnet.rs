//! IPv6 subnet address synthesis
//!
//! Many domains can share one dynamically-assigned IPv6 network while each
//! keeps a fixed host suffix: the prefix bits come from the discovered
//! address, the remaining bits from the operator-chosen suffix.
//!
//! ```rust
//! use ddns_core::subnet::{HostSuffix, PrefixLength, synthesize};
//!
//! let prefix = PrefixLength::new(56).unwrap();
//! let suffix = HostSuffix::parse(prefix, "::10/64").unwrap();
//! let addr = synthesize("2001:db8:abcd::1", prefix, &suffix).unwrap();
//! assert_eq!(addr.to_string(), "2001:db8:abcd::10");
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use crate::bits::BitVector128;
use crate::error::{Error, Result};

/// Smallest accepted global prefix length
pub const MIN_PREFIX_LENGTH: u8 = 1;

/// Largest accepted global prefix length; every target keeps at least 64 host bits
pub const MAX_PREFIX_LENGTH: u8 = 64;

/// Validated global prefix length in `[1, 64]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrefixLength(u8);

impl PrefixLength {
    /// Validate a prefix length
    pub fn new(len: u8) -> Result<Self> {
        if len < MIN_PREFIX_LENGTH || len > 128 {
            return Err(Error::invalid_prefix_length(format!(
                "prefix length {} is outside [1, 128]",
                len
            )));
        }
        if len > MAX_PREFIX_LENGTH {
            return Err(Error::invalid_prefix_length(format!(
                "prefix length {} > {} is not supported",
                len, MAX_PREFIX_LENGTH
            )));
        }
        Ok(Self(len))
    }

    /// The raw bit count
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PrefixLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

/// A host suffix parsed from `"<address>/<length>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSuffix {
    text: String,
    length: u8,
    bits: BitVector128,
}

impl HostSuffix {
    /// Parse and validate a suffix against the global prefix length
    ///
    /// Fails when the text is malformed, when the declared length is outside
    /// `[1, 128]`, when `length + prefix > 128`, or when the address has bits
    /// set above its declared length.
    pub fn parse(prefix: PrefixLength, text: &str) -> Result<Self> {
        let (addr_text, len_text) = text
            .split_once('/')
            .filter(|(_, len)| !len.contains('/'))
            .ok_or_else(|| {
                Error::invalid_address(format!("invalid suffix format '{}', expected <address>/<length>", text))
            })?;

        let length: u32 = len_text.trim().parse().map_err(|e| {
            Error::invalid_address(format!("failed to parse length of suffix '{}': {}", text, e))
        })?;
        if !(1..=128).contains(&length) {
            return Err(Error::invalid_prefix_length(format!(
                "suffix length {} of '{}' is outside [1, 128]",
                length, text
            )));
        }
        if length + u32::from(prefix.get()) > 128 {
            return Err(Error::suffix_overlap(format!(
                "suffix '{}' length + prefix length {} > 128",
                text,
                prefix.get()
            )));
        }

        let addr = match addr_text.trim().parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => v6,
            Ok(IpAddr::V4(v4)) => v4.to_ipv6_mapped(),
            Err(_) => {
                return Err(Error::invalid_address(format!("invalid suffix address in '{}'", text)));
            }
        };

        let bits = BitVector128::from(addr);
        if !bits.and(BitVector128::mask(128 - length)).is_zero() {
            return Err(Error::suffix_overlap(format!(
                "suffix '{}' has bits set above its length {}",
                text, length
            )));
        }

        Ok(Self {
            text: text.to_string(),
            length: length as u8,
            bits,
        })
    }

    /// The suffix bits
    pub fn bits(&self) -> BitVector128 {
        self.bits
    }

    /// The declared suffix length
    pub fn length(&self) -> u8 {
        self.length
    }
}

impl fmt::Display for HostSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Combine the top `prefix` bits of `current` with `suffix`
pub fn synthesize(current: &str, prefix: PrefixLength, suffix: &HostSuffix) -> Result<Ipv6Addr> {
    let addr: Ipv6Addr = current
        .trim()
        .parse()
        .map_err(|_| Error::invalid_address(format!("'{}' is not an IPv6 address", current)))?;

    let network = BitVector128::from(addr).and(BitVector128::mask(u32::from(prefix.get())));
    Ok(network.or(suffix.bits()).to_address())
}
