mod sink;
mod summary;

use crate::{sink::WriteSink, summary::Summary};
use anyhow::{Context as _, Result};
use clap::Parser;
use flowtrace_core::{ManifestReader, Tee, TraceReader, correlate};
use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Reconstruct per-flow completion times from a simulation's scheduled
/// flow manifest and transport event trace.
#[derive(Parser)]
struct Command {
    /// scheduled-flow manifest log
    manifest: PathBuf,

    /// transport event trace log (`node status time seq` lines)
    trace: PathBuf,

    /// write the completion dataset here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// append the mean completion time to this file
    #[arg(long)]
    mean: Option<PathBuf>,

    /// append the tail (maximum) completion time to this file
    #[arg(long)]
    tail: Option<PathBuf>,

    /// print run counters to stderr
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    let cmd = Command::parse();

    let manifest = ManifestReader::new(open(&cmd.manifest)?);
    let trace = TraceReader::new(open(&cmd.trace)?);

    let output: Box<dyn Write> = match &cmd.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = Tee(WriteSink::new(BufWriter::new(output)), Summary::new());

    let stats = correlate::run(manifest, trace, &mut sink)
        .with_context(|| format!("correlating {}", cmd.trace.display()))?;

    let Tee(mut writer, summary) = sink;
    writer.flush()?;

    if let Some(path) = &cmd.mean
        && let Some(mean) = summary.mean()
    {
        append_summary(path, mean)?;
    }
    if let Some(path) = &cmd.tail
        && let Some(tail) = summary.tail()
    {
        append_summary(path, tail)?;
    }

    if cmd.stats {
        eprintln!("events:        {}", stats.events);
        eprintln!("flows started: {}", stats.flows_started);
        eprintln!("flows merged:  {}", stats.flows_merged);
        eprintln!("flows dropped: {}", stats.flows_dropped);
        eprintln!("completions:   {}", stats.completions);
        eprintln!("ignored recvs: {}", stats.ignored_recvs);
    }

    Ok(())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .with_context(|| format!("cannot open {}", path.display()))
}

/// append one `\t<value>` line, creating the file on first use
fn append_summary(path: &Path, value: impl fmt::Display) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("cannot append to {}", path.display()))?;
    writeln!(file, "\t{value}")?;
    Ok(())
}
