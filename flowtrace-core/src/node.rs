use anyhow::anyhow;
use std::{fmt, str};

/// The identifier of a simulated node as it appears in both logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub const ZERO: Self = NodeId::new(0);
    pub const ONE: Self = NodeId::new(1);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn into_u64(self) -> u64 {
        self.0
    }
}

impl str::FromStr for NodeId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self).map_err(|error| anyhow!("{error}"))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
