use anyhow::Result;
use flowtrace_core::{CompletionRecord, CompletionSink};
use std::io::Write;

/// Sink writing one delimited `node bytes elapsed` line per record.
pub struct WriteSink<W> {
    writer: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CompletionSink for WriteSink<W> {
    fn record(&mut self, completion: CompletionRecord) -> Result<()> {
        writeln!(self.writer, "{completion}")?;
        Ok(())
    }
}
