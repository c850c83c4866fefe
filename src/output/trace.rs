//! JSON-lines trace writer

use crate::error::Result;
use crate::pagination::PageObserver;
use serde::Serialize;
use std::io::{self, Stdout, Write};
use tracing::warn;

/// How records are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// One compact JSON document per line
    #[default]
    Lines,
    /// Indented JSON, records separated by a newline
    Pretty,
}

/// Writes every observed item as one JSON record
///
/// Write failures are logged and counted but never abort the walk that
/// feeds the trace.
pub struct JsonLinesTrace<W: Write> {
    writer: W,
    style: OutputStyle,
    written: usize,
    failures: usize,
}

impl JsonLinesTrace<Stdout> {
    /// Trace to standard output
    pub fn stdout(style: OutputStyle) -> Self {
        Self::new(io::stdout()).with_style(style)
    }
}

impl<W: Write> JsonLinesTrace<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            style: OutputStyle::Lines,
            written: 0,
            failures: 0,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: OutputStyle) -> Self {
        self.style = style;
        self
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Records that could not be written
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write a single record followed by a newline
    pub fn write_record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        write_json(&mut self.writer, record, self.style)?;
        self.written += 1;
        Ok(())
    }
}

impl<T: Serialize, W: Write> PageObserver<T> for JsonLinesTrace<W> {
    fn on_page(&mut self, items: &[T]) {
        for item in items {
            if let Err(e) = self.write_record(item) {
                self.failures += 1;
                warn!("Failed to write trace record: {e}");
            }
        }
        if let Err(e) = self.writer.flush() {
            warn!("Failed to flush trace output: {e}");
        }
    }
}

/// Print one value to stdout in the given style
pub fn print_json<T: Serialize + ?Sized>(value: &T, style: OutputStyle) -> Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_json(&mut lock, value, style)?;
    lock.flush()?;
    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
    style: OutputStyle,
) -> Result<()> {
    match style {
        OutputStyle::Lines => serde_json::to_writer(&mut *writer, value)?,
        OutputStyle::Pretty => serde_json::to_writer_pretty(&mut *writer, value)?,
    }
    writer.write_all(b"\n")?;
    Ok(())
}
