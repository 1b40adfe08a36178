use crate::{
    queue::{FlowDescriptor, NodeQueueStore},
    record::{EventKind, ScheduledFlow, TraceEvent},
    sink::{CompletionRecord, CompletionSink},
};
use anyhow::Result;

/// The stream-correlation engine.
///
/// A [`Correlator`] advances two independent, time-ordered sequences in
/// lockstep: the manifest of scheduled flows and the trace of transport
/// events. The trace drives everything; the manifest cursor only moves
/// as a side effect of processing trace events, never on its own.
///
/// For each trace event, in this order:
///
/// 1. **Reconcile missed flows.** Scheduled flows whose start tick has
///    fallen strictly more than one tick behind the event were never
///    observed as a `Send` (the simulated node was still busy). Their
///    payload is folded into the open descriptor of their node's queue,
///    or silently dropped when the node has nothing in flight. The
///    cursor advances either way.
/// 2. **Match a flow start.** A `Send` whose node matches the cursor and
///    whose timestamp is exactly one tick after the scheduled start
///    opens a new descriptor. The one-tick offset is intrinsic to the
///    trace format: the manifest records the tick before the socket
///    emits. Mutually exclusive with step 3.
/// 3. **Match a completion.** A `Recv` whose acknowledged sequence
///    number reaches the byte-range end of the node's oldest descriptor
///    (mod 2^32) emits exactly one [`CompletionRecord`] for that
///    descriptor, then discards every further descriptor at the head of
///    the queue that the same acknowledgment also covers. Subsumed
///    descriptors produce no record of their own.
///
/// Once the manifest is exhausted steps 1 and 2 are permanently
/// disabled; remaining trace events can only complete flows already in
/// flight. A `Recv` with no matching descriptor is ignored.
///
/// The engine is single threaded and fully deterministic: the same two
/// input sequences always produce the same ordered record sequence and
/// the same [`RunStats`].
pub struct Correlator<M> {
    manifest: M,
    /// current unconsumed scheduled flow; `None` once the manifest is
    /// drained
    cursor: Option<ScheduledFlow>,
    queues: NodeQueueStore,
    stats: RunStats,
}

/// Diagnostic counters for one correlation run.
///
/// Counters never influence the emitted record sequence; they expose the
/// silent policies (dropped missed flows, ignored acknowledgments) that
/// are deliberately not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    /// trace events processed
    pub events: u64,
    /// descriptors opened by a matching `Send`
    pub flows_started: u64,
    /// missed scheduled flows folded into an open descriptor
    pub flows_merged: u64,
    /// missed scheduled flows dropped because their node had nothing in
    /// flight
    pub flows_dropped: u64,
    /// completion records emitted
    pub completions: u64,
    /// `Recv` events that matched no descriptor
    pub ignored_recvs: u64,
}

impl<M> Correlator<M>
where
    M: Iterator<Item = Result<ScheduledFlow>>,
{
    /// build a correlator over `manifest` and position the cursor on its
    /// first record.
    pub fn new(manifest: M) -> Result<Self> {
        let mut correlator = Self {
            manifest,
            cursor: None,
            queues: NodeQueueStore::new(),
            stats: RunStats::default(),
        };
        correlator.advance_cursor()?;
        Ok(correlator)
    }

    /// counters accumulated so far.
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    fn advance_cursor(&mut self) -> Result<()> {
        self.cursor = self.manifest.next().transpose()?;
        Ok(())
    }

    /// process one trace event, emitting zero or one completion record
    /// to `sink`.
    pub fn feed<S: CompletionSink>(&mut self, event: &TraceEvent, sink: &mut S) -> Result<()> {
        self.stats.events += 1;

        // scheduled flows more than one tick behind this event never
        // produced their own Send
        while let Some(scheduled) = self.cursor {
            if scheduled.start_tick.next() >= event.time {
                break;
            }
            if self.queues.absorb_into_last(scheduled.node, scheduled.size) {
                self.stats.flows_merged += 1;
            } else {
                self.stats.flows_dropped += 1;
            }
            self.advance_cursor()?;
        }

        if let Some(scheduled) = self.cursor
            && scheduled.node == event.node
            && event.kind == EventKind::Send
            && scheduled.start_tick.next() == event.time
        {
            let descriptor =
                FlowDescriptor::new(event.node, event.seq, event.time, scheduled.size);
            self.queues.push_back(event.node, descriptor);
            self.stats.flows_started += 1;
            self.advance_cursor()?;
        } else if event.kind == EventKind::Recv {
            match self.queues.front(event.node) {
                Some(&front) if event.seq.reaches(front.end_seq()) => {
                    sink.record(CompletionRecord {
                        node: event.node,
                        bytes_acked: event.seq.wrapping_since(front.start_seq),
                        elapsed: event.time.since(front.start_time),
                    })?;
                    self.stats.completions += 1;
                    self.queues.pop_front(event.node);

                    // one acknowledgment may also cover merged or
                    // adjacent flows queued behind the front; they are
                    // discarded without a record of their own
                    while self
                        .queues
                        .front(event.node)
                        .is_some_and(|front| event.seq.reaches(front.end_seq()))
                    {
                        self.queues.pop_front(event.node);
                    }
                }
                _ => self.stats.ignored_recvs += 1,
            }
        }

        Ok(())
    }
}

/// Correlate a full trace against a manifest, forwarding every
/// completion record to `sink` as it is resolved.
///
/// The first malformed record from either stream, or the first sink
/// error, aborts the run. Both streams ending is the normal terminal
/// state: the run finishes when the trace is exhausted, whether or not
/// the manifest is.
pub fn run<M, T, S>(manifest: M, trace: T, sink: &mut S) -> Result<RunStats>
where
    M: Iterator<Item = Result<ScheduledFlow>>,
    T: Iterator<Item = Result<TraceEvent>>,
    S: CompletionSink,
{
    let mut correlator = Correlator::new(manifest)?;
    for event in trace {
        correlator.feed(&event?, sink)?;
    }
    Ok(correlator.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{node::NodeId, seq::SeqNum, tick::Tick};
    use anyhow::anyhow;

    fn flow(node: u64, size: u64, start_tick: u64) -> ScheduledFlow {
        ScheduledFlow {
            node: NodeId::new(node),
            size,
            start_tick: Tick::new(start_tick),
        }
    }

    fn send(node: u64, time: u64, seq: u32) -> TraceEvent {
        TraceEvent {
            node: NodeId::new(node),
            kind: EventKind::Send,
            time: Tick::new(time),
            seq: SeqNum::new(seq),
        }
    }

    fn recv(node: u64, time: u64, seq: u32) -> TraceEvent {
        TraceEvent {
            node: NodeId::new(node),
            kind: EventKind::Recv,
            time: Tick::new(time),
            seq: SeqNum::new(seq),
        }
    }

    fn correlate(
        manifest: &[ScheduledFlow],
        trace: &[TraceEvent],
    ) -> (Vec<CompletionRecord>, RunStats) {
        let mut sink = Vec::new();
        let stats = run(
            manifest.iter().copied().map(Ok),
            trace.iter().copied().map(Ok),
            &mut sink,
        )
        .expect("well-formed inputs");
        (sink, stats)
    }

    #[test]
    fn end_to_end_single_flow() {
        let (records, stats) = correlate(
            &[flow(0, 100, 5)],
            &[send(0, 6, 1000), recv(0, 50, 1100)],
        );

        assert_eq!(
            records,
            vec![CompletionRecord {
                node: NodeId::ZERO,
                bytes_acked: 100,
                elapsed: 44,
            }]
        );
        assert_eq!(stats.flows_started, 1);
        assert_eq!(stats.completions, 1);
    }

    #[test]
    fn send_only_matches_one_tick_after_schedule() {
        // observed Send at the scheduled tick itself, not one after
        let (records, stats) = correlate(
            &[flow(0, 100, 5)],
            &[send(0, 5, 1000), recv(0, 50, 1100)],
        );

        assert!(records.is_empty());
        assert_eq!(stats.flows_started, 0);
        assert_eq!(stats.ignored_recvs, 1);
    }

    #[test]
    fn send_for_wrong_node_does_not_start_a_flow() {
        let (records, stats) = correlate(&[flow(1, 100, 5)], &[send(0, 6, 1000)]);

        assert!(records.is_empty());
        assert_eq!(stats.flows_started, 0);
    }

    #[test]
    fn missed_flow_merges_into_open_descriptor() {
        // the second scheduled flow (start tick 7) never sends: by the
        // time the trace reaches tick 20 it is more than one tick behind
        // and is folded into the first flow's descriptor
        let (records, stats) = correlate(
            &[flow(0, 100, 5), flow(0, 50, 7)],
            &[send(0, 6, 1000), recv(0, 20, 1150)],
        );

        assert_eq!(
            records,
            vec![CompletionRecord {
                node: NodeId::ZERO,
                bytes_acked: 150,
                elapsed: 14,
            }],
            "one record covering the sum of both declared sizes"
        );
        assert_eq!(stats.flows_merged, 1);
        assert_eq!(stats.completions, 1);
    }

    #[test]
    fn missed_flow_with_idle_node_is_dropped() {
        // node 1 has nothing in flight when its scheduled flow falls
        // behind: the flow is dropped, not an error
        let (records, stats) = correlate(
            &[flow(1, 100, 0)],
            &[send(0, 6, 1000), recv(0, 20, 1100)],
        );

        assert!(records.is_empty());
        assert_eq!(stats.flows_dropped, 1);
        assert_eq!(stats.ignored_recvs, 1, "no descriptor ever opened");
    }

    #[test]
    fn one_ack_pops_several_descriptors_but_emits_once() {
        let (records, stats) = correlate(
            &[flow(0, 100, 5), flow(0, 50, 9)],
            &[send(0, 6, 1000), send(0, 10, 1100), recv(0, 20, 1200)],
        );

        assert_eq!(
            records,
            vec![CompletionRecord {
                node: NodeId::ZERO,
                bytes_acked: 200,
                elapsed: 14,
            }],
            "only the original front generates a record"
        );
        assert_eq!(stats.flows_started, 2);
        assert_eq!(stats.completions, 1);

        // both descriptors are gone: a later ack finds nothing
        let (_, stats) = correlate(
            &[flow(0, 100, 5), flow(0, 50, 9)],
            &[
                send(0, 6, 1000),
                send(0, 10, 1100),
                recv(0, 20, 1200),
                recv(0, 25, 1300),
            ],
        );
        assert_eq!(stats.ignored_recvs, 1);
        assert_eq!(stats.completions, 1);
    }

    #[test]
    fn partial_ack_leaves_the_descriptor_in_flight() {
        let (records, stats) = correlate(
            &[flow(0, 100, 5)],
            &[send(0, 6, 1000), recv(0, 20, 1050), recv(0, 50, 1100)],
        );

        assert_eq!(
            records,
            vec![CompletionRecord {
                node: NodeId::ZERO,
                bytes_acked: 100,
                elapsed: 44,
            }],
            "elapsed counts from the original Send, not the partial ack"
        );
        assert_eq!(stats.ignored_recvs, 1);
    }

    #[test]
    fn completion_across_sequence_rollover() {
        // byte range [2^32 - 10, 10): the end wraps past zero, and the
        // ack observed after the wrap must still close the flow
        let start = u32::MAX - 9;
        let (records, _) = correlate(
            &[flow(0, 20, 5)],
            &[send(0, 6, start), recv(0, 30, 10)],
        );

        assert_eq!(
            records,
            vec![CompletionRecord {
                node: NodeId::ZERO,
                bytes_acked: 20,
                elapsed: 24,
            }]
        );
    }

    #[test]
    fn recv_before_rollover_end_stays_in_flight() {
        let start = u32::MAX - 9;
        let (records, stats) = correlate(
            &[flow(0, 20, 5)],
            &[send(0, 6, start), recv(0, 30, u32::MAX - 2)],
        );

        assert!(records.is_empty());
        assert_eq!(stats.ignored_recvs, 1);
    }

    #[test]
    fn exhausted_manifest_never_starts_new_flows() {
        let (records, stats) = correlate(
            &[flow(0, 100, 5)],
            &[
                send(0, 6, 1000),
                // manifest is drained: this Send opens nothing
                send(0, 8, 1100),
                recv(0, 20, 1100),
            ],
        );

        assert_eq!(records.len(), 1);
        assert_eq!(stats.flows_started, 1);
        assert_eq!(
            records[0].bytes_acked, 100,
            "the in-flight descriptor still completes normally"
        );
    }

    #[test]
    fn recv_on_empty_queue_is_ignored() {
        let (records, stats) = correlate(&[], &[recv(0, 10, 500)]);

        assert!(records.is_empty());
        assert_eq!(stats.ignored_recvs, 1);
        assert_eq!(stats.events, 1);
    }

    #[test]
    fn emitted_values_are_non_negative_and_ordered() {
        let manifest = [flow(0, 100, 5), flow(1, 200, 7), flow(0, 50, 11)];
        let trace = [
            send(0, 6, 1000),
            send(1, 8, 0),
            recv(0, 10, 1100),
            send(0, 12, 1100),
            recv(1, 20, 200),
            recv(0, 25, 1150),
        ];
        let (records, stats) = correlate(&manifest, &trace);

        assert_eq!(records.len(), 3);
        assert_eq!(stats.completions, 3);
        // emission order follows the trace, not the manifest
        assert_eq!(
            records.iter().map(|r| r.node).collect::<Vec<_>>(),
            vec![NodeId::ZERO, NodeId::ONE, NodeId::ZERO]
        );
    }

    #[test]
    fn identical_inputs_give_identical_runs() {
        let manifest = [flow(0, 100, 5), flow(0, 50, 7), flow(1, 10, 9)];
        let trace = [
            send(0, 6, 1000),
            send(1, 10, 0),
            recv(0, 20, 1150),
            recv(1, 22, 10),
        ];

        let first = correlate(&manifest, &trace);
        let second = correlate(&manifest, &trace);
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_manifest_record_aborts_the_run() {
        let manifest: Vec<Result<ScheduledFlow>> =
            vec![Ok(flow(0, 100, 5)), Err(anyhow!("line 2"))];
        let trace = [send(0, 6, 1000), send(0, 20, 1100)];

        let mut sink = Vec::new();
        let error = run(
            manifest.into_iter(),
            trace.iter().copied().map(Ok),
            &mut sink,
        )
        .expect_err("the second manifest record is malformed");
        assert_eq!(error.to_string(), "line 2");
    }
}
