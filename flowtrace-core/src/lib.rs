//! Reconstruct per-flow completion times from a network simulation's
//! event logs.
//!
//! A simulation produces two independent, time-ordered logs: a
//! *manifest* of scheduled flows (node, intended start tick, payload
//! size) and a *trace* of transport events (`Send`/`Recv` with node,
//! timestamp and 32-bit sequence number). This crate correlates the two
//! streams per node and emits one [`CompletionRecord`] for every flow it
//! can resolve: the bytes acknowledged and the elapsed ticks between the
//! flow's first observed `Send` and the `Recv` that covered its byte
//! range.
//!
//! The interesting part lives in [`correlate`]: per-node FIFO
//! reconciliation with sequence arithmetic modulo 2^32, folding of
//! scheduled flows that never started into the flow that kept their node
//! busy, and coalescing of a single acknowledgment across several
//! adjacent flows. Everything around it ([`reader`] for the delimited
//! log lines, [`sink`] for the output stream) is the thin boundary this
//! engine is driven through.
//!
//! ```
//! use flowtrace_core::{ManifestReader, TraceReader, correlate};
//!
//! let manifest = "0 tcp 1 9 100 5\n";
//! let trace = "0 Send 6 1000\n0 Recv 50 1100\n";
//!
//! let mut completions = Vec::new();
//! let stats = correlate::run(
//!     ManifestReader::new(manifest.as_bytes()),
//!     TraceReader::new(trace.as_bytes()),
//!     &mut completions,
//! )
//! .unwrap();
//!
//! assert_eq!(completions[0].to_string(), "0 100 44");
//! assert_eq!(stats.completions, 1);
//! ```

pub mod correlate;
pub mod node;
pub mod queue;
pub mod reader;
pub mod record;
pub mod seq;
pub mod sink;
pub mod tick;

pub use self::{
    correlate::{Correlator, RunStats},
    node::NodeId,
    queue::{FlowDescriptor, NodeQueueStore},
    reader::{ManifestReader, RecordReader, TraceReader},
    record::{EventKind, ScheduledFlow, TraceEvent, UnknownStatus},
    seq::SeqNum,
    sink::{CompletionRecord, CompletionSink, Tee},
    tick::Tick,
};
