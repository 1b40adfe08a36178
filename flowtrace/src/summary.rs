use anyhow::Result;
use flowtrace_core::{CompletionRecord, CompletionSink};

/// Streaming mean and tail of the completion times of one run.
///
/// Observes the records as they are emitted; nothing is retained beyond
/// the running aggregates, so the summary costs O(1) memory however long
/// the trace is.
#[derive(Debug, Default)]
pub struct Summary {
    count: u64,
    total_elapsed: u128,
    max_elapsed: u64,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, completion: &CompletionRecord) {
        self.count += 1;
        self.total_elapsed += completion.elapsed as u128;
        self.max_elapsed = self.max_elapsed.max(completion.elapsed);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// mean completion time, `None` when no flow completed.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.total_elapsed as f64 / self.count as f64)
    }

    /// tail (maximum) completion time, `None` when no flow completed.
    pub fn tail(&self) -> Option<u64> {
        (self.count > 0).then_some(self.max_elapsed)
    }
}

impl CompletionSink for Summary {
    fn record(&mut self, completion: CompletionRecord) -> Result<()> {
        self.observe(&completion);
        Ok(())
    }
}
