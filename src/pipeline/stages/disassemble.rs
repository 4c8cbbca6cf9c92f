//! Disassemble: turns a stream of cards into a stream of elements.
//!
//! Every card contributes at most `record_width` elements followed by one
//! separator. Short cards are not padded, so the output is only fixed-width
//! when every card is exactly `record_width` long.

use crate::pipeline::channel::{Consumer, Producer};
use crate::pipeline::error::PipelineResult;
use crate::pipeline::stage::{StageKind, StageStats};
use crate::pipeline::stages::finish;

/// Split each card from `input` into elements on `output` until `input` closes.
pub fn disassemble<T: Clone>(
    input: Consumer<Vec<T>>,
    output: Producer<T>,
    record_width: usize,
    separator: T,
) -> PipelineResult<StageStats> {
    tracing::debug!("Disassemble stage started (record width {})", record_width);
    let mut stats = StageStats::new();
    let result = run(&input, &output, record_width, &separator, &mut stats);
    finish(StageKind::Disassemble, stats, output, result)
}

fn run<T: Clone>(
    input: &Consumer<Vec<T>>,
    output: &Producer<T>,
    record_width: usize,
    separator: &T,
    stats: &mut StageStats,
) -> PipelineResult<()> {
    while let Some(card) = input.recv()? {
        stats.record_received();
        if card.len() > record_width {
            tracing::trace!(
                "Truncating card of {} elements to {}",
                card.len(),
                record_width
            );
        }
        for element in card.into_iter().take(record_width) {
            output.send(element)?;
            stats.record_emitted();
        }
        output.send(separator.clone())?;
        stats.record_emitted();
    }
    Ok(())
}
