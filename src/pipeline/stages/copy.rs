//! Copy: relays every element unchanged.

use crate::pipeline::channel::{Consumer, Producer};
use crate::pipeline::error::PipelineResult;
use crate::pipeline::stage::{StageKind, StageStats};
use crate::pipeline::stages::finish;

/// Relay values from `input` to `output` in order until `input` closes.
pub fn copy<T>(input: Consumer<T>, output: Producer<T>) -> PipelineResult<StageStats> {
    tracing::debug!("Copy stage started");
    let mut stats = StageStats::new();
    let result = relay(&input, &output, &mut stats);
    finish(StageKind::Copy, stats, output, result)
}

fn relay<T>(
    input: &Consumer<T>,
    output: &Producer<T>,
    stats: &mut StageStats,
) -> PipelineResult<()> {
    while let Some(value) = input.recv()? {
        stats.record_received();
        output.send(value)?;
        stats.record_emitted();
    }
    Ok(())
}
