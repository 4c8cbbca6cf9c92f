//! Squash: collapses every adjacent pair of marker elements into a single
//! replacement element.
//!
//! The stage is a two-state machine. In `Normal` a non-marker is emitted
//! immediately and a marker moves to `Pending`. In `Pending` a second marker
//! emits the replacement, anything else emits the held marker followed by
//! that element; both return to `Normal`. What happens to a marker still
//! pending when the input closes is decided by [`TrailingMarker`].

use crate::pipeline::channel::{Consumer, Producer};
use crate::pipeline::error::PipelineResult;
use crate::pipeline::stage::{StageKind, StageStats};
use crate::pipeline::stages::finish;
use serde::{Deserialize, Serialize};

/// End-of-stream policy for an odd trailing marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingMarker {
    /// Emit the unpaired marker as-is before closing.
    #[default]
    Lenient,
    /// Drop the unpaired marker.
    Strict,
}

/// Marker, replacement and trailing policy for one Squash run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashParams<T> {
    pub marker: T,
    pub replacement: T,
    pub trailing: TrailingMarker,
}

impl<T> SquashParams<T> {
    pub fn new(marker: T, replacement: T) -> Self {
        Self {
            marker,
            replacement,
            trailing: TrailingMarker::Lenient,
        }
    }

    pub fn with_trailing(mut self, trailing: TrailingMarker) -> Self {
        self.trailing = trailing;
        self
    }
}

impl Default for SquashParams<char> {
    fn default() -> Self {
        Self::new(crate::config::MARKER, crate::config::REPLACEMENT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Pending,
}

/// The Squash state machine, independent of any channel.
///
/// `emit` is called for every output element; its error aborts the step.
#[derive(Debug)]
pub struct Squasher<'a, T> {
    params: &'a SquashParams<T>,
    state: State,
}

impl<'a, T: PartialEq + Clone> Squasher<'a, T> {
    pub fn new(params: &'a SquashParams<T>) -> Self {
        Self {
            params,
            state: State::Normal,
        }
    }

    /// Whether a marker is being held back awaiting its successor.
    pub fn is_pending(&self) -> bool {
        self.state == State::Pending
    }

    /// Consume one input element.
    pub fn feed<F>(&mut self, value: T, mut emit: F) -> PipelineResult<()>
    where
        F: FnMut(T) -> PipelineResult<()>,
    {
        let is_marker = value == self.params.marker;
        match self.state {
            State::Normal if is_marker => {
                self.state = State::Pending;
                Ok(())
            }
            State::Normal => emit(value),
            State::Pending => {
                self.state = State::Normal;
                if is_marker {
                    emit(self.params.replacement.clone())
                } else {
                    emit(self.params.marker.clone())?;
                    emit(value)
                }
            }
        }
    }

    /// Handle end of stream.
    pub fn finish<F>(&mut self, mut emit: F) -> PipelineResult<()>
    where
        F: FnMut(T) -> PipelineResult<()>,
    {
        if self.state == State::Normal {
            return Ok(());
        }
        self.state = State::Normal;
        match self.params.trailing {
            TrailingMarker::Lenient => emit(self.params.marker.clone()),
            TrailingMarker::Strict => {
                tracing::trace!("Dropping unpaired trailing marker");
                Ok(())
            }
        }
    }
}

/// Run Squash from `input` to `output` until `input` closes.
pub fn squash<T>(
    input: Consumer<T>,
    output: Producer<T>,
    params: &SquashParams<T>,
) -> PipelineResult<StageStats>
where
    T: PartialEq + Clone,
{
    tracing::debug!("Squash stage started ({:?} trailing policy)", params.trailing);
    let mut stats = StageStats::new();
    let result = run(&input, &output, params, &mut stats);
    finish(StageKind::Squash, stats, output, result)
}

fn run<T>(
    input: &Consumer<T>,
    output: &Producer<T>,
    params: &SquashParams<T>,
    stats: &mut StageStats,
) -> PipelineResult<()>
where
    T: PartialEq + Clone,
{
    let mut squasher = Squasher::new(params);
    while let Some(value) = input.recv()? {
        stats.record_received();
        squasher.feed(value, |v| {
            output.send(v)?;
            stats.record_emitted();
            Ok(())
        })?;
    }
    squasher.finish(|v| {
        output.send(v)?;
        stats.record_emitted();
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel::channel;
    use proptest::prelude::*;
    use std::thread;

    /// Drive the state machine directly over a string.
    fn squash_str(input: &str, trailing: TrailingMarker) -> String {
        let params = SquashParams::default().with_trailing(trailing);
        let mut squasher = Squasher::new(&params);
        let mut out = String::new();
        for c in input.chars() {
            squasher
                .feed(c, |v| {
                    out.push(v);
                    Ok(())
                })
                .unwrap();
        }
        squasher
            .finish(|v| {
                out.push(v);
                Ok(())
            })
            .unwrap();
        out
    }

    /// Run the full stage over channels.
    fn squash_channel(input: &str, trailing: TrailingMarker) -> (String, StageStats) {
        let values: Vec<char> = input.chars().collect();
        let (in_tx, in_rx) = channel();
        let (out_tx, out_rx) = channel();
        let feeder = thread::spawn(move || in_tx.send_all(values));
        let stage = thread::spawn(move || {
            let params = SquashParams::default().with_trailing(trailing);
            squash(in_rx, out_tx, &params)
        });

        let output: String = out_rx.drain().unwrap().into_iter().collect();
        feeder.join().unwrap().unwrap();
        (output, stage.join().unwrap().unwrap())
    }

    #[test]
    fn test_pair_becomes_arrow() {
        assert_eq!(squash_str("a**b", TrailingMarker::Lenient), "a↑b");
    }

    #[test]
    fn test_odd_run_mid_stream() {
        assert_eq!(squash_str("a***b", TrailingMarker::Lenient), "a↑*b");
    }

    #[test]
    fn test_trailing_marker_policies() {
        assert_eq!(squash_str("ab*", TrailingMarker::Lenient), "ab*");
        assert_eq!(squash_str("ab*", TrailingMarker::Strict), "ab");
        assert_eq!(squash_str("***", TrailingMarker::Lenient), "↑*");
        assert_eq!(squash_str("***", TrailingMarker::Strict), "↑");
    }

    #[test]
    fn test_single_marker_then_marker_free() {
        assert_eq!(squash_str("*a*b", TrailingMarker::Strict), "*a*b");
    }

    #[test]
    fn test_even_trailing_run_is_fully_squashed() {
        assert_eq!(squash_str("x****", TrailingMarker::Strict), "x↑↑");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(squash_str("", TrailingMarker::Lenient), "");
    }

    #[test]
    fn test_pending_state() {
        let params = SquashParams::default();
        let mut squasher = Squasher::new(&params);
        squasher.feed('*', |_| Ok(())).unwrap();
        assert!(squasher.is_pending());
        squasher.feed('*', |_| Ok(())).unwrap();
        assert!(!squasher.is_pending());
    }

    #[test]
    fn test_stage_over_channels() {
        let (output, stats) = squash_channel("a**b*", TrailingMarker::Lenient);
        assert_eq!(output, "a↑b*");
        assert_eq!(stats, StageStats { received: 5, emitted: 4 });
    }

    #[test]
    fn test_stage_strict_drops_trailing() {
        let (output, stats) = squash_channel("ab*", TrailingMarker::Strict);
        assert_eq!(output, "ab");
        assert_eq!(stats, StageStats { received: 3, emitted: 2 });
    }

    #[test]
    fn test_generic_elements() {
        let params = SquashParams::new(0u8, 255u8);
        let mut squasher = Squasher::new(&params);
        let mut out = Vec::new();
        for v in [1u8, 0, 0, 2, 0] {
            squasher
                .feed(v, |x| {
                    out.push(x);
                    Ok(())
                })
                .unwrap();
        }
        squasher
            .finish(|x| {
                out.push(x);
                Ok(())
            })
            .unwrap();
        assert_eq!(out, vec![1, 255, 2, 0]);
    }

    /// Expected lenient output computed run by run.
    fn expected_by_runs(input: &str) -> String {
        let mut out = String::new();
        let mut run = 0usize;
        for c in input.chars() {
            if c == '*' {
                run += 1;
                continue;
            }
            out.extend(std::iter::repeat('↑').take(run / 2));
            if run % 2 == 1 {
                out.push('*');
            }
            run = 0;
            out.push(c);
        }
        out.extend(std::iter::repeat('↑').take(run / 2));
        if run % 2 == 1 {
            out.push('*');
        }
        out
    }

    proptest! {
        #[test]
        fn test_marker_free_input_is_unchanged(input in "[a-z ]{0,100}") {
            prop_assert_eq!(squash_str(&input, TrailingMarker::Lenient), input.clone());
            prop_assert_eq!(squash_str(&input, TrailingMarker::Strict), input);
        }

        #[test]
        fn test_marker_runs_map_to_replacements(input in "[ab*]{0,100}") {
            prop_assert_eq!(squash_str(&input, TrailingMarker::Lenient), expected_by_runs(&input));
        }

        #[test]
        fn test_squash_is_idempotent_once_markers_are_gone(input in "[ab*]{0,100}") {
            let once = squash_str(&input, TrailingMarker::Strict);
            if !once.contains('*') {
                prop_assert_eq!(squash_str(&once, TrailingMarker::Strict), once);
            }
        }
    }
}
