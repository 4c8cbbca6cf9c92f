//! Stream-processing pipelines built from communicating sequential processes.
//!
//! Each stage is a transducer that owns its state, reads from one channel and
//! writes to another. Channels are unbuffered, so a stage that cannot proceed
//! simply blocks until its neighbour is ready.
//!
//! # Architecture
//!
//! ```text
//! cards --> [Disassemble] --west--> [Copy | Squash] --east--> [Assemble] --> lines
//!             (thread)                  (thread)                (caller)
//! ```
//!
//! # Design
//!
//! - **Ownership is the protocol**: `Producer::close` consumes the producer,
//!   so a channel is closed at most once and never written after closing.
//! - **Closure propagates downstream**: every stage reads until its input
//!   closes and then closes its output exactly once.
//! - **Failure propagates both ways**: a failing stage trips the pipeline's
//!   `CancelToken`, which wakes every blocked send and receive.

pub mod cancel;
pub mod channel;
pub mod error;
pub mod executor;
pub mod stage;
pub mod stages;

pub use cancel::CancelToken;
pub use channel::{channel, channel_with_cancel, Consumer, Producer};
pub use error::{PipelineError, PipelineResult};
pub use executor::{conway, reformat, Pipeline, PipelineReport, Variant};
pub use stage::{StageKind, StageStats};
pub use stages::{
    assemble, copy, disassemble, squash, Card, Line, LineBuffer, SquashParams, Squasher,
    TrailingMarker,
};
