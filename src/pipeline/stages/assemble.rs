//! Assemble: packs elements into fixed-width lines.
//!
//! A line is emitted as soon as its last position is written. When the input
//! closes, a partially filled line is padded with the fill element and
//! emitted; an empty buffer emits nothing.

use crate::pipeline::channel::{Consumer, Producer};
use crate::pipeline::error::PipelineResult;
use crate::pipeline::stage::{StageKind, StageStats};
use crate::pipeline::stages::finish;

/// Fixed-width line under construction.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    buf: Vec<char>,
    width: usize,
}

impl LineBuffer {
    /// Create an empty buffer. A zero width is treated as one.
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            buf: Vec::with_capacity(width),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of positions written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write `c` into the next position. Returns the completed line when this
    /// write filled the last position; the buffer is then empty again.
    pub fn push(&mut self, c: char) -> Option<String> {
        self.buf.push(c);
        if self.buf.len() == self.width {
            let line = self.buf.iter().collect();
            self.buf.clear();
            Some(line)
        } else {
            None
        }
    }

    /// Pad the remaining positions with `fill` and return the line, or `None`
    /// if nothing has been written.
    pub fn flush(&mut self, fill: char) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        self.buf.resize(self.width, fill);
        let line = self.buf.iter().collect();
        self.buf.clear();
        Some(line)
    }
}

/// Pack elements from `input` into lines on `output` until `input` closes.
pub fn assemble(
    input: Consumer<char>,
    output: Producer<String>,
    line_width: usize,
    fill: char,
) -> PipelineResult<StageStats> {
    tracing::debug!("Assemble stage started (line width {})", line_width);
    let mut stats = StageStats::new();
    let result = run(&input, &output, line_width, fill, &mut stats);
    finish(StageKind::Assemble, stats, output, result)
}

fn run(
    input: &Consumer<char>,
    output: &Producer<String>,
    line_width: usize,
    fill: char,
    stats: &mut StageStats,
) -> PipelineResult<()> {
    let mut line = LineBuffer::new(line_width);
    while let Some(c) = input.recv()? {
        stats.record_received();
        if let Some(full) = line.push(c) {
            output.send(full)?;
            stats.record_emitted();
        }
    }
    if let Some(partial) = line.flush(fill) {
        tracing::trace!("Flushing final partial line");
        output.send(partial)?;
        stats.record_emitted();
    }
    Ok(())
}
