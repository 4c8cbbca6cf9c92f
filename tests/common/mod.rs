//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use cardflow::pipeline::{channel, Card, Line, Pipeline, PipelineReport, PipelineResult};
use std::thread;
use tracing_subscriber::EnvFilter;

/// Install a tracing subscriber once per test binary.
///
/// Controlled with `RUST_LOG`, e.g. `RUST_LOG=cardflow=trace cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Feed `cards` from one thread, collect lines on another, and run
/// `pipeline` on the current one.
pub fn run_pipeline(
    pipeline: &Pipeline,
    cards: Vec<Card>,
) -> (Vec<Line>, PipelineResult<PipelineReport>) {
    let (cards_tx, cards_rx) = channel();
    let (lines_tx, lines_rx) = channel();

    let reader = thread::spawn(move || cards_tx.send_all(cards));
    let printer = thread::spawn(move || lines_rx.drain());

    let result = pipeline.run(cards_rx, lines_tx);
    let _ = reader.join().expect("card reader panicked");
    let lines = printer
        .join()
        .expect("line printer panicked")
        .expect("unbound consumer cannot be cancelled");
    (lines, result)
}

/// Concatenate lines back into one character stream.
pub fn join_lines(lines: &[Line]) -> String {
    lines.concat()
}
