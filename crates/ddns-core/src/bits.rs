//! 128-bit values for IPv6 prefix arithmetic
//!
//! Bit 0 is the most significant bit (top of `hi`), bit 127 the lowest
//! (`lo & 1`). Conversions to and from [`Ipv6Addr`] use network byte
//! order, most-significant octet first.

use std::net::Ipv6Addr;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A 128-bit unsigned value held as two 64-bit halves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitVector128 {
    hi: u64,
    lo: u64,
}

impl BitVector128 {
    /// All bits clear
    pub const ZERO: Self = Self { hi: 0, lo: 0 };

    /// All bits set
    pub const ONES: Self = Self {
        hi: u64::MAX,
        lo: u64::MAX,
    };

    /// Build a value from its high and low halves
    pub const fn from_halves(hi: u64, lo: u64) -> Self {
        Self { hi, lo }
    }

    /// The (high, low) halves
    pub const fn halves(&self) -> (u64, u64) {
        (self.hi, self.lo)
    }

    /// Value with the top `n` bits set and the rest clear
    ///
    /// `n` is clamped to 128.
    pub fn mask(n: u32) -> Self {
        let n = n.min(128);
        // checked_shr yields None for shifts >= 64, which is exactly the
        // "all bits shifted out" case
        let hi = !u64::MAX.checked_shr(n).unwrap_or(0);
        let lo = !u64::MAX.checked_shr(n.saturating_sub(64)).unwrap_or(0);
        Self { hi, lo }
    }

    /// Whether every bit is clear
    pub const fn is_zero(&self) -> bool {
        self.hi | self.lo == 0
    }

    /// Bitwise AND
    pub const fn and(self, m: Self) -> Self {
        Self {
            hi: self.hi & m.hi,
            lo: self.lo & m.lo,
        }
    }

    /// Bitwise OR
    pub const fn or(self, m: Self) -> Self {
        Self {
            hi: self.hi | m.hi,
            lo: self.lo | m.lo,
        }
    }

    /// Bitwise XOR
    pub const fn xor(self, m: Self) -> Self {
        Self {
            hi: self.hi ^ m.hi,
            lo: self.lo ^ m.lo,
        }
    }

    /// Bitwise NOT
    pub const fn not(self) -> Self {
        Self {
            hi: !self.hi,
            lo: !self.lo,
        }
    }

    /// Number of leading one bits
    pub const fn leading_ones(&self) -> u32 {
        if self.hi == u64::MAX {
            64 + self.lo.leading_ones()
        } else {
            self.hi.leading_ones()
        }
    }

    /// Number of trailing zero bits
    pub const fn trailing_zeros(&self) -> u32 {
        if self.lo == 0 {
            64 + self.hi.trailing_zeros()
        } else {
            self.lo.trailing_zeros()
        }
    }

    /// Convert from the 16-octet address representation
    pub fn from_address(addr: Ipv6Addr) -> Self {
        let octets = addr.octets();
        let mut hi = [0u8; 8];
        let mut lo = [0u8; 8];
        hi.copy_from_slice(&octets[..8]);
        lo.copy_from_slice(&octets[8..]);
        Self {
            hi: u64::from_be_bytes(hi),
            lo: u64::from_be_bytes(lo),
        }
    }

    /// Convert to the 16-octet address representation
    pub fn to_address(self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets[..8].copy_from_slice(&self.hi.to_be_bytes());
        octets[8..].copy_from_slice(&self.lo.to_be_bytes());
        Ipv6Addr::from(octets)
    }
}

impl From<Ipv6Addr> for BitVector128 {
    fn from(addr: Ipv6Addr) -> Self {
        Self::from_address(addr)
    }
}

impl From<BitVector128> for Ipv6Addr {
    fn from(bits: BitVector128) -> Self {
        bits.to_address()
    }
}

impl BitAnd for BitVector128 {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for BitVector128 {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl BitXor for BitVector128 {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        self.xor(rhs)
    }
}

impl Not for BitVector128 {
    type Output = Self;

    fn not(self) -> Self {
        BitVector128::not(self)
    }
}
