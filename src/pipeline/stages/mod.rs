//! The transducers a pipeline is built from.
//!
//! Each stage takes its input and output endpoints by value and runs in the
//! calling thread until the input closes. On success it closes its output
//! exactly once and reports its counters; on failure it abandons the output
//! without flushing, which cancels the surrounding pipeline when the output
//! is bound to a token.

pub mod assemble;
pub mod copy;
pub mod disassemble;
pub mod squash;

pub use assemble::{assemble, LineBuffer};
pub use copy::copy;
pub use disassemble::disassemble;
pub use squash::{squash, SquashParams, Squasher, TrailingMarker};

use crate::pipeline::channel::Producer;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::stage::{StageKind, StageStats};

/// One card as read from the card reader.
pub type Card = Vec<char>;

/// One assembled lineprinter line.
pub type Line = String;

/// Close or abandon `output` depending on how the stage ended.
pub(crate) fn finish<T>(
    stage: StageKind,
    stats: StageStats,
    output: Producer<T>,
    result: PipelineResult<()>,
) -> PipelineResult<StageStats> {
    match result {
        Ok(()) => {
            output.close();
            tracing::debug!(
                "{} stage finished: {} received, {} emitted",
                stage,
                stats.received,
                stats.emitted
            );
            Ok(stats)
        }
        Err(e) => {
            tracing::warn!(
                "{} stage aborted after {} received, {} emitted: {}",
                stage,
                stats.received,
                stats.emitted,
                e
            );
            drop(output);
            Err(e)
        }
    }
}
