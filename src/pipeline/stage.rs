//! Stage identity and per-stage counters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The transducers a pipeline can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    /// Splits cards into elements, one separator after each card.
    Disassemble,
    /// Relays elements unchanged.
    Copy,
    /// Collapses marker pairs into the replacement element.
    Squash,
    /// Packs elements into fixed-width lines.
    Assemble,
}

impl StageKind {
    /// Get the display name for this stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            StageKind::Disassemble => "Disassemble",
            StageKind::Copy => "Copy",
            StageKind::Squash => "Squash",
            StageKind::Assemble => "Assemble",
        }
    }

    /// Name given to the OS thread running this stage.
    pub fn thread_name(&self) -> &'static str {
        match self {
            StageKind::Disassemble => "cardflow-disassemble",
            StageKind::Copy => "cardflow-copy",
            StageKind::Squash => "cardflow-squash",
            StageKind::Assemble => "cardflow-assemble",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Counters reported by a stage when it finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStats {
    /// Values taken from the input channel
    pub received: u64,
    /// Values sent on the output channel
    pub emitted: u64,
}

impl StageStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_received(&mut self) {
        self.received += 1;
    }

    #[inline]
    pub(crate) fn record_emitted(&mut self) {
        self.emitted += 1;
    }
}
