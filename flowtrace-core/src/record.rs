use crate::{node::NodeId, seq::SeqNum, tick::Tick};
use anyhow::{Context as _, Result, ensure};
use std::{fmt, str};

/// Direction of a transport trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// the sender's highest transmitted sequence number advanced
    Send,
    /// the sender observed a new highest acknowledged sequence number
    Recv,
}

/// One transport-level event from the trace log.
///
/// Wire format: `node status time seq`, whitespace delimited, where
/// `status` is `Send` or `Recv` and the other fields are plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub node: NodeId,
    pub kind: EventKind,
    pub time: Tick,
    pub seq: SeqNum,
}

/// One scheduled flow from the manifest log.
///
/// Wire format: six whitespace-delimited fields of which three are
/// consumed here: field 0 is the node, field 4 the payload size in bytes
/// and field 5 the intended start tick (dot-separated, see
/// [`Tick::parse_dotted`]). The remaining fields belong to the scheduler
/// and are carried through unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledFlow {
    pub node: NodeId,
    pub size: u64,
    pub start_tick: Tick,
}

/// Error returned when a status field is neither `Send` nor `Recv`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown event status: {0}")]
pub struct UnknownStatus(String);

impl str::FromStr for EventKind {
    type Err = UnknownStatus;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Send" => Ok(Self::Send),
            "Recv" => Ok(Self::Recv),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => "Send".fmt(f),
            Self::Recv => "Recv".fmt(f),
        }
    }
}

impl str::FromStr for TraceEvent {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split_whitespace();

        let node = fields
            .next()
            .context("missing trace field `node'")?
            .parse()
            .context("trace field `node'")?;
        let kind = fields
            .next()
            .context("missing trace field `status'")?
            .parse()
            .context("trace field `status'")?;
        let time = fields
            .next()
            .context("missing trace field `time'")?
            .parse()
            .context("trace field `time'")?;
        let seq = fields
            .next()
            .context("missing trace field `seq'")?
            .parse()
            .context("trace field `seq'")?;
        ensure!(fields.next().is_none(), "trailing fields in trace event");

        Ok(Self {
            node,
            kind,
            time,
            seq,
        })
    }
}

impl str::FromStr for ScheduledFlow {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        ensure!(
            fields.len() >= 6,
            "manifest record has {} fields, expected 6",
            fields.len()
        );

        let node = fields[0].parse().context("manifest field `node'")?;
        let size = fields[4].parse().context("manifest field `size'")?;
        let start_tick =
            Tick::parse_dotted(fields[5]).context("manifest field `start tick'")?;

        Ok(Self {
            node,
            size,
            start_tick,
        })
    }
}
