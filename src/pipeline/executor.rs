//! Pipeline executor: wires Disassemble → (Copy | Squash) → Assemble.
//!
//! A run creates two internal channels, spawns Disassemble and the middle
//! stage on dedicated named threads, runs Assemble on the calling thread and
//! then joins both threads before returning.
//!
//! All endpoints, including the caller's, are bound to one cancellation
//! token for the duration of the run. The first stage to fail trips it, the
//! other stages unwind with `Cancelled`, and `run` reports the failure that
//! started it. Records must be fed from a thread other than the one calling
//! `run`, since `run` blocks until the record channel is closed.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::channel::{channel_with_cancel, Consumer, Producer};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::stage::{StageKind, StageStats};
use crate::pipeline::stages::{assemble, copy, disassemble, squash, Card, Line};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::thread::{self, JoinHandle};

type StageHandle = JoinHandle<PipelineResult<StageStats>>;

/// Which transducer sits between Disassemble and Assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Cards reprinted unchanged: `[DISASSEMBLE || COPY || ASSEMBLE]`.
    Reformat,
    /// Marker pairs squashed on the way: `[DISASSEMBLE || SQUASH || ASSEMBLE]`.
    Conway,
}

impl Variant {
    pub fn middle_stage(&self) -> StageKind {
        match self {
            Variant::Reformat => StageKind::Copy,
            Variant::Conway => StageKind::Squash,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Reformat => f.write_str("Reformat"),
            Variant::Conway => f.write_str("Conway"),
        }
    }
}

/// Per-stage counters from a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub variant: Variant,
    pub disassemble: StageStats,
    pub middle: StageStats,
    pub assemble: StageStats,
}

impl PipelineReport {
    /// Cards consumed from the record channel.
    pub fn cards(&self) -> u64 {
        self.disassemble.received
    }

    /// Lines delivered to the output channel.
    pub fn lines(&self) -> u64 {
        self.assemble.emitted
    }
}

/// A configured, reusable pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    variant: Variant,
    config: PipelineConfig,
    cancel: Option<CancelToken>,
}

impl Pipeline {
    /// Create a pipeline, validating `config`.
    pub fn new(variant: Variant, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            variant,
            config,
            cancel: None,
        })
    }

    /// A pipeline with the default constants.
    pub fn with_defaults(variant: Variant) -> Self {
        Self {
            variant,
            config: PipelineConfig::default(),
            cancel: None,
        }
    }

    /// Use `token` for runs of this pipeline instead of a fresh one.
    ///
    /// A stage failure trips the token, so anything else bound to it is
    /// cancelled as well.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run to completion: returns once Assemble has closed `lines` and both
    /// spawned stages have been joined.
    pub fn run(
        &self,
        records: Consumer<Card>,
        lines: Producer<Line>,
    ) -> PipelineResult<PipelineReport> {
        let token = self.cancel.clone().unwrap_or_default();
        let records = records.bind_cancel(&token);
        let lines = lines.bind_cancel(&token);
        let (west_tx, west_rx) = channel_with_cancel::<char>(&token);
        let (east_tx, east_rx) = channel_with_cancel::<char>(&token);

        tracing::info!("{} pipeline started", self.variant);

        let record_width = self.config.record_width;
        let separator = self.config.separator;
        let disassembler = spawn_stage(StageKind::Disassemble, &token, move || {
            disassemble(records, west_tx, record_width, separator)
        })?;

        let middle_kind = self.variant.middle_stage();
        let middle = match self.variant {
            Variant::Reformat => {
                spawn_stage(middle_kind, &token, move || copy(west_rx, east_tx))
            }
            Variant::Conway => {
                let params = self.config.squash_params();
                spawn_stage(middle_kind, &token, move || squash(west_rx, east_tx, &params))
            }
        };
        let middle = match middle {
            Ok(handle) => handle,
            Err(e) => {
                // The unstarted stage's endpoints were dropped, which has
                // already cancelled Disassemble.
                if let Err(join_err) = join_stage(StageKind::Disassemble, disassembler) {
                    if !join_err.is_cancelled() {
                        tracing::warn!(
                            "{} stage failed while {} could not start: {}",
                            StageKind::Disassemble,
                            middle_kind,
                            join_err
                        );
                    }
                }
                return Err(e);
            }
        };

        let assembled = assemble(east_rx, lines, self.config.line_width, self.config.fill);
        if assembled.is_err() {
            token.cancel();
        }

        let disassembled = join_stage(StageKind::Disassemble, disassembler);
        let middled = join_stage(middle_kind, middle);

        match (disassembled, middled, assembled) {
            (Ok(disassemble), Ok(middle), Ok(assemble)) => {
                let report = PipelineReport {
                    variant: self.variant,
                    disassemble,
                    middle,
                    assemble,
                };
                tracing::info!(
                    "{} pipeline finished: {} cards, {} lines",
                    self.variant,
                    report.cards(),
                    report.lines()
                );
                Ok(report)
            }
            (d, m, a) => {
                let err = first_failure([d.err(), m.err(), a.err()]);
                tracing::warn!("{} pipeline failed: {}", self.variant, err);
                Err(err)
            }
        }
    }
}

/// Run the plain reformatting pipeline with the default constants.
pub fn reformat(records: Consumer<Card>, lines: Producer<Line>) -> PipelineResult<PipelineReport> {
    Pipeline::with_defaults(Variant::Reformat).run(records, lines)
}

/// Run Conway's pipeline (lenient trailing-marker policy) with the default
/// constants.
pub fn conway(records: Consumer<Card>, lines: Producer<Line>) -> PipelineResult<PipelineReport> {
    Pipeline::with_defaults(Variant::Conway).run(records, lines)
}

/// Spawn `f` on a named thread. A failing stage trips `token`.
fn spawn_stage<F>(stage: StageKind, token: &CancelToken, f: F) -> PipelineResult<StageHandle>
where
    F: FnOnce() -> PipelineResult<StageStats> + Send + 'static,
{
    let token = token.clone();
    thread::Builder::new()
        .name(stage.thread_name().to_string())
        .spawn(move || {
            let result = f();
            if result.is_err() {
                token.cancel();
            }
            result
        })
        .map_err(|source| PipelineError::Spawn { stage, source })
}

fn join_stage(stage: StageKind, handle: StageHandle) -> PipelineResult<StageStats> {
    match handle.join() {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            tracing::error!("{} stage panicked: {}", stage, message);
            Err(PipelineError::StagePanicked { stage, message })
        }
    }
}

/// Pick the error that started a failure: the first, in pipeline order, that
/// is not a consequence of cancellation.
fn first_failure(errors: [Option<PipelineError>; 3]) -> PipelineError {
    let mut cancelled = None;
    for err in errors.into_iter().flatten() {
        if err.is_cancelled() {
            cancelled.get_or_insert(err);
        } else {
            return err;
        }
    }
    cancelled.unwrap_or(PipelineError::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel::channel;
    use std::time::Duration;

    fn card(s: &str) -> Card {
        s.chars().collect()
    }

    fn run_pipeline(pipeline: &Pipeline, cards: Vec<Card>) -> (Vec<Line>, PipelineReport) {
        let (records_tx, records_rx) = channel();
        let (lines_tx, lines_rx) = channel();
        let feeder = thread::spawn(move || records_tx.send_all(cards));
        let collector = thread::spawn(move || lines_rx.drain());

        let report = pipeline.run(records_rx, lines_tx).unwrap();
        feeder.join().unwrap().unwrap();
        (collector.join().unwrap().unwrap(), report)
    }

    #[test]
    fn test_variant_middle_stage() {
        assert_eq!(Variant::Reformat.middle_stage(), StageKind::Copy);
        assert_eq!(Variant::Conway.middle_stage(), StageKind::Squash);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = PipelineConfig::default().with_line_width(0);
        assert!(Pipeline::new(Variant::Reformat, config).is_err());
    }

    #[test]
    fn test_reformat_small_widths() {
        let config = PipelineConfig::default()
            .with_record_width(3)
            .with_line_width(5)
            .with_fill('.');
        let pipeline = Pipeline::new(Variant::Reformat, config).unwrap();

        let (lines, report) = run_pipeline(&pipeline, vec![card("abcdef"), card("gh")]);
        // "abc " + "gh " = "abc gh "
        assert_eq!(lines, vec!["abc g".to_string(), "h ...".to_string()]);
        assert_eq!(report.cards(), 2);
        assert_eq!(report.lines(), 2);
        assert_eq!(report.middle.received, report.middle.emitted);
    }

    #[test]
    fn test_conway_squashes_across_cards() {
        let config = PipelineConfig::default()
            .with_record_width(4)
            .with_line_width(8)
            .with_separator('*');
        let pipeline = Pipeline::new(Variant::Conway, config).unwrap();

        // "ab*" then separator '*' pairs with the card's trailing marker.
        let (lines, _) = run_pipeline(&pipeline, vec![card("ab*"), card("c")]);
        assert_eq!(lines, vec!["ab↑c*   ".to_string()]);
    }

    #[test]
    fn test_no_cards_no_lines() {
        let pipeline = Pipeline::with_defaults(Variant::Conway);
        let (lines, report) = run_pipeline(&pipeline, Vec::new());
        assert!(lines.is_empty());
        assert_eq!(report.cards(), 0);
    }

    #[test]
    fn test_caller_cancel_stops_blocked_pipeline() {
        let token = CancelToken::new();
        let pipeline = Pipeline::with_defaults(Variant::Reformat).with_cancel(token.clone());
        let (records_tx, records_rx) = channel::<Card>();
        let (lines_tx, _lines_rx) = channel();

        let runner = thread::spawn(move || pipeline.run(records_rx, lines_tx));
        thread::sleep(Duration::from_millis(50));
        token.cancel();

        let result = runner.join().unwrap();
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        drop(records_tx);
    }

    #[test]
    fn test_dropped_output_consumer_is_reported() {
        let pipeline = Pipeline::with_defaults(Variant::Reformat);
        let (records_tx, records_rx) = channel();
        let (lines_tx, lines_rx) = channel::<Line>();
        drop(lines_rx);

        // The first line completes partway through the second card, so the
        // third card is never taken.
        let cards: Vec<Card> = (0..3).map(|_| vec!['x'; 80]).collect();
        let feeder = thread::spawn(move || records_tx.send_all(cards));

        let result = pipeline.run(records_rx, lines_tx);
        assert!(matches!(result, Err(PipelineError::Disconnected)));
        // The feeder is unblocked by cancellation rather than hanging.
        assert!(feeder.join().unwrap().is_err());
    }

    #[test]
    fn test_first_failure_prefers_root_cause() {
        let err = first_failure([
            Some(PipelineError::Cancelled),
            None,
            Some(PipelineError::Disconnected),
        ]);
        assert!(matches!(err, PipelineError::Disconnected));

        let err = first_failure([Some(PipelineError::Cancelled), None, None]);
        assert!(err.is_cancelled());

        let err = first_failure([
            Some(PipelineError::Cancelled),
            Some(PipelineError::StagePanicked {
                stage: StageKind::Squash,
                message: "boom".to_string(),
            }),
            Some(PipelineError::Cancelled),
        ]);
        assert!(matches!(
            err,
            PipelineError::StagePanicked {
                stage: StageKind::Squash,
                ..
            }
        ));
    }

    #[test]
    fn test_stage_panic_cancels_neighbours() {
        let token = CancelToken::new();
        let (tx, rx) = channel_with_cancel::<char>(&token);
        let handle = spawn_stage(StageKind::Squash, &token, move || {
            let _output = tx;
            panic!("boom");
        })
        .unwrap();

        // The unclosed output is dropped while unwinding.
        assert!(matches!(rx.recv(), Err(PipelineError::Cancelled)));
        match join_stage(StageKind::Squash, handle) {
            Err(PipelineError::StagePanicked { stage, message }) => {
                assert_eq!(stage, StageKind::Squash);
                assert_eq!(message, "boom");
            }
            other => panic!("expected StagePanicked, got {:?}", other),
        }
        assert!(token.is_cancelled());
    }
}
