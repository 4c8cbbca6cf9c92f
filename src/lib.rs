//! # cardflow: card reformatting with communicating sequential processes
//!
//! Small concurrent pipelines in which independent stages exchange single
//! characters over unbuffered channels. A card reader's 80-column records are
//! disassembled into a character stream, optionally passed through Squash
//! (every `**` becomes `↑`), and reassembled into 125-column lineprinter
//! lines.
//!
//! ## Architecture
//!
//! - **Stages**: Copy, Squash, Disassemble and Assemble, each a plain
//!   function over a [`Consumer`] and a [`Producer`]
//! - **Pipelines**: [`Pipeline`] wires three stages together, running two of
//!   them on their own threads and the last on the caller's
//! - **Communication**: crossbeam rendezvous channels with explicit close
//! - **Configuration**: [`PipelineConfig`] holds the widths and special
//!   characters, loadable from TOML or JSON
//!
//! ## Example
//!
//! ```ignore
//! use cardflow::pipeline::{channel, conway};
//!
//! let (cards_tx, cards_rx) = channel();
//! let (lines_tx, lines_rx) = channel();
//!
//! std::thread::spawn(move || cards_tx.send_all(read_cards()));
//! let printer = std::thread::spawn(move || lines_rx.drain());
//!
//! let report = conway(cards_rx, lines_tx)?;
//! for line in printer.join().unwrap()? {
//!     println!("{}", line);
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{CardflowError, Result, ResultExt};
pub use pipeline::{
    channel, CancelToken, Card, Consumer, Line, Pipeline, PipelineError, PipelineReport,
    PipelineResult, Producer, StageKind, StageStats, TrailingMarker, Variant,
};
