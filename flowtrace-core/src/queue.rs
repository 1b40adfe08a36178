use crate::{node::NodeId, seq::SeqNum, tick::Tick};
use std::collections::{HashMap, VecDeque};

/// One in-flight (possibly merged) flow awaiting acknowledgment.
///
/// Created when a `Send` event matches the manifest head. Its byte count
/// may grow while it is still the last descriptor of its node's queue:
/// scheduled flows that never produced their own `Send` are folded into
/// it. Once a newer descriptor is appended behind it, it is immutable
/// until popped by the acknowledgment that covers its byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowDescriptor {
    pub node: NodeId,
    /// first sequence number of this flow's byte range, as observed on
    /// the wire
    pub start_seq: SeqNum,
    /// timestamp of the originating `Send` event
    pub start_time: Tick,
    /// total payload attributed to this descriptor, including every
    /// absorbed flow
    pub bytes: u64,
    /// true once at least one missed scheduled flow has been folded in
    pub merged: bool,
}

impl FlowDescriptor {
    pub fn new(node: NodeId, start_seq: SeqNum, start_time: Tick, bytes: u64) -> Self {
        Self {
            node,
            start_seq,
            start_time,
            bytes,
            merged: false,
        }
    }

    /// the first sequence number past this flow's byte range, mod 2^32.
    ///
    /// An acknowledgment that reaches this value has covered every byte
    /// of the descriptor.
    #[inline]
    pub fn end_seq(&self) -> SeqNum {
        self.start_seq.wrapping_add(self.bytes)
    }

    /// fold a missed scheduled flow's payload into this descriptor.
    pub fn absorb(&mut self, size: u64) {
        self.bytes += size;
        self.merged = true;
    }
}

/// One FIFO of in-flight flow descriptors per node.
///
/// Insertion order is acknowledgment order. Only the most recently
/// appended descriptor of a queue is open for merging; every operation
/// touches a single node's queue and is O(1) amortised.
///
/// A store is built fresh for every run and owned exclusively by the
/// correlator; no state survives a run.
#[derive(Debug, Default)]
pub struct NodeQueueStore {
    queues: HashMap<NodeId, VecDeque<FlowDescriptor>>,
}

impl NodeQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// append a descriptor to the back of `node`'s queue, creating the
    /// queue on first access.
    pub fn push_back(&mut self, node: NodeId, descriptor: FlowDescriptor) {
        self.queues.entry(node).or_default().push_back(descriptor)
    }

    /// the oldest in-flight descriptor for `node`, if any.
    pub fn front(&self, node: NodeId) -> Option<&FlowDescriptor> {
        self.queues.get(&node)?.front()
    }

    /// remove and return the oldest in-flight descriptor for `node`.
    pub fn pop_front(&mut self, node: NodeId) -> Option<FlowDescriptor> {
        self.queues.get_mut(&node)?.pop_front()
    }

    /// fold `size` bytes into the most recently appended descriptor of
    /// `node`'s queue.
    ///
    /// Returns `false` when the queue is empty: there is no open
    /// descriptor to absorb the missed flow and the caller drops it.
    pub fn absorb_into_last(&mut self, node: NodeId, size: u64) -> bool {
        match self.queues.get_mut(&node).and_then(VecDeque::back_mut) {
            Some(last) => {
                last.absorb(size);
                true
            }
            None => false,
        }
    }

    /// number of in-flight descriptors for `node`.
    pub fn depth(&self, node: NodeId) -> usize {
        self.queues.get(&node).map_or(0, VecDeque::len)
    }
}
