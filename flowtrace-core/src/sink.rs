use crate::node::NodeId;
use anyhow::Result;
use std::fmt;

/// One resolved flow: the correlator's output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionRecord {
    pub node: NodeId,
    /// wrapped distance from the flow's first sequence number to the
    /// acknowledgment that completed it
    pub bytes_acked: u64,
    /// ticks between the originating `Send` and the completing `Recv`
    pub elapsed: u64,
}

impl fmt::Display for CompletionRecord {
    /// the delimited output line: `node bytes_acked elapsed`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.node, self.bytes_acked, self.elapsed)
    }
}

/// Consumer of the ordered completion stream.
///
/// Records arrive one at a time, in emission order, as the correlator
/// resolves them: append-only, never batched or reordered. A sink error
/// aborts the run.
pub trait CompletionSink {
    fn record(&mut self, completion: CompletionRecord) -> Result<()>;
}

impl CompletionSink for Vec<CompletionRecord> {
    fn record(&mut self, completion: CompletionRecord) -> Result<()> {
        self.push(completion);
        Ok(())
    }
}

/// Feed every record to two sinks, in order.
pub struct Tee<A, B>(pub A, pub B);

impl<A: CompletionSink, B: CompletionSink> CompletionSink for Tee<A, B> {
    fn record(&mut self, completion: CompletionRecord) -> Result<()> {
        self.0.record(completion)?;
        self.1.record(completion)
    }
}
