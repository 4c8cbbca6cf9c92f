//! Cancellation token shared by the stages of a pipeline.
//!
//! A token wraps the sending half of a crossbeam channel that never carries
//! a message. Cancelling drops that sender, which disconnects the channel and
//! wakes every `select!` that is waiting on the receiving half, in every
//! thread at once.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct Trip {
    cancelled: AtomicBool,
    tx: Mutex<Option<Sender<()>>>,
}

/// Cloneable handle used to cancel a running pipeline.
///
/// Every clone observes the same state. Keeping a token alive never cancels
/// anything; only [`CancelToken::cancel`] does.
#[derive(Clone)]
pub struct CancelToken {
    trip: Arc<Trip>,
    signal: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, signal) = bounded(0);
        Self {
            trip: Arc::new(Trip {
                cancelled: AtomicBool::new(false),
                tx: Mutex::new(Some(tx)),
            }),
            signal,
        }
    }

    /// Cancel every endpoint bound to this token. Idempotent.
    pub fn cancel(&self) {
        // The flag is raised before the signal disconnects so that a receiver
        // woken by the disconnect always sees it.
        if self.trip.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let sender = match self.trip.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);
        tracing::debug!("Cancellation token tripped");
    }

    pub fn is_cancelled(&self) -> bool {
        self.trip.cancelled.load(Ordering::SeqCst)
    }

    /// Receiver that becomes ready (disconnected) once the token trips.
    pub(crate) fn signal(&self) -> &Receiver<()> {
        &self.signal
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
