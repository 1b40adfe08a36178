use anyhow::anyhow;
use std::{fmt, str};

/// A 32-bit transport sequence number.
///
/// The underlying transport counts bytes in a 32-bit sequence space, so
/// every comparison and distance here is performed modulo 2^32. A flow
/// whose byte range straddles the rollover (`start_seq` near `u32::MAX`,
/// end past zero) must still be matched correctly against acknowledgments
/// observed after the wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeqNum(u32);

impl SeqNum {
    pub const ZERO: Self = SeqNum(0);

    pub const fn new(seq: u32) -> Self {
        Self(seq)
    }

    #[inline]
    pub fn into_u32(self) -> u32 {
        self.0
    }

    /// the sequence number `bytes` bytes after this one, mod 2^32.
    #[must_use = "function does not modify the current value"]
    #[inline]
    pub fn wrapping_add(self, bytes: u64) -> Self {
        Self(self.0.wrapping_add(bytes as u32))
    }

    /// unsigned wrapped distance from `start` to `self`.
    ///
    /// This is the "bytes acknowledged" figure when `self` is an
    /// acknowledgment and `start` the first sequence number of a flow.
    #[inline]
    pub fn wrapping_since(self, start: Self) -> u64 {
        self.0.wrapping_sub(start.0) as u64
    }

    /// serial-number comparison: has `self` reached or passed `threshold`?
    ///
    /// True iff `self` lies in the half of the sequence space at or ahead
    /// of `threshold`. With `threshold = start + bytes mod 2^32` this is
    /// the completion test for a flow's byte range, and it keeps working
    /// across the 32-bit rollover where a plain `>=` would not.
    #[inline]
    pub fn reaches(self, threshold: Self) -> bool {
        self.0.wrapping_sub(threshold.0) as i32 >= 0
    }
}

impl str::FromStr for SeqNum {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self).map_err(|error| anyhow!("{error}"))
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
