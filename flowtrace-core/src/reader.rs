use crate::record::{ScheduledFlow, TraceEvent};
use anyhow::{Context as _, Result};
use std::{io::BufRead, marker::PhantomData, str::FromStr};

/// Lazy, forward-only reader over the transport event trace.
pub type TraceReader<R> = RecordReader<R, TraceEvent>;

/// Lazy, forward-only reader over the scheduled-flow manifest.
pub type ManifestReader<R> = RecordReader<R, ScheduledFlow>;

/// Line-oriented reader turning a [`BufRead`] into a sequence of parsed
/// records.
///
/// One record per line; lines that are empty after trimming are skipped.
/// A line that fails to parse is reported as an error carrying its line
/// number and ends the run: malformed input is fatal, there is no
/// partial recovery. Ordering within the stream (monotonic timestamps or
/// start ticks) is a precondition of the correlator, not checked here.
pub struct RecordReader<R, T> {
    reader: R,
    line: String,
    line_number: usize,
    marker: PhantomData<T>,
}

impl<R: BufRead, T> RecordReader<R, T> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
            marker: PhantomData,
        }
    }
}

impl<R, T> Iterator for RecordReader<R, T>
where
    R: BufRead,
    T: FromStr<Err = anyhow::Error>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            self.line_number += 1;

            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(error) => {
                    let error = anyhow::Error::from(error)
                        .context(format!("line {}", self.line_number));
                    return Some(Err(error));
                }
            }

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }

            return Some(
                line.parse()
                    .with_context(|| format!("line {}", self.line_number)),
            );
        }
    }
}
