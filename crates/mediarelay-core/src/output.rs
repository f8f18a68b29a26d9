//! Output of job outcomes as JSON or JSON Lines.
//!
//! JSONL streams each outcome as soon as it is recorded, which suits batch
//! runs. JSON buffers outcomes and writes them on [`OutcomeWriter::finish`]:
//! a single object for one job, an array otherwise.

use crate::job::{JobOutcome, OutcomeStatus};
use std::io::{self, Write};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Writes job outcomes and keeps a tally of how they ended.
pub struct OutcomeWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<JobOutcome>,
    completed: usize,
    failed: usize,
}

impl<W: Write> OutcomeWriter<W> {
    /// Create a new outcome writer.
    ///
    /// `pretty` only affects the JSON format; JSONL is always one line per outcome.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            completed: 0,
            failed: 0,
        }
    }

    /// Record one outcome. JSONL writes it immediately.
    pub fn record(&mut self, outcome: JobOutcome) -> io::Result<()> {
        match outcome.status {
            OutcomeStatus::Completed => self.completed += 1,
            OutcomeStatus::Failed => self.failed += 1,
            OutcomeStatus::Processing => {}
        }
        match self.format {
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, &outcome).map_err(io::Error::other)?;
                writeln!(self.writer)?;
                self.writer.flush()
            }
            OutputFormat::Json => {
                self.pending.push(outcome);
                Ok(())
            }
        }
    }

    /// Write buffered outcomes (JSON format) and flush.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.format == OutputFormat::Json && !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            if pending.len() == 1 {
                self.write_json(&pending[0])?;
            } else {
                self.write_json(&pending)?;
            }
        }
        self.writer.flush()
    }

    fn write_json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, value).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, value).map_err(io::Error::other)?;
        }
        writeln!(self.writer)
    }

    /// `(completed, failed)` counts so far.
    pub fn tally(&self) -> (usize, usize) {
        (self.completed, self.failed)
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Serialize an item to a JSON string.
pub fn to_json<T: serde::Serialize>(item: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(item)
    } else {
        serde_json::to_string(item)
    }
}
