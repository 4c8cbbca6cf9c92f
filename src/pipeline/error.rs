//! Pipeline-specific error types.

use crate::pipeline::stage::StageKind;
use thiserror::Error;

/// Errors that can occur while a stage or pipeline is running.
///
/// Malformed input is never an error here; the transducers have boundary
/// policies for that. These variants only cover channel-protocol problems.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Every consumer of the output channel has gone away.
    #[error("Channel disconnected: no consumer left to receive")]
    Disconnected,

    /// The pipeline's cancellation token was tripped.
    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("Stage {stage} panicked: {message}")]
    StagePanicked { stage: StageKind, message: String },

    #[error("Failed to spawn stage {stage}: {source}")]
    Spawn {
        stage: StageKind,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
