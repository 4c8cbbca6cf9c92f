//! Unbuffered, closable channels connecting pipeline stages.
//!
//! A channel is a crossbeam rendezvous channel (`bounded(0)`): a send blocks
//! until a consumer takes the value and a receive blocks until a value or the
//! end of the stream arrives. End of stream is signalled by closing the
//! [`Producer`], which can only happen once because `close` consumes it.
//!
//! Endpoints can be bound to a [`CancelToken`]. A blocked operation on a
//! bound endpoint returns [`PipelineError::Cancelled`] as soon as the token
//! trips. Dropping a bound producer without closing it counts as abandoning
//! the stream and trips the token; an unbound producer that is dropped just
//! closes the channel.

use crate::pipeline::cancel::CancelToken;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crossbeam_channel::{bounded, select, Receiver, Sender};

/// Create an unbound rendezvous channel.
pub fn channel<T>() -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = bounded(0);
    (
        Producer {
            tx,
            cancel: None,
            closed: false,
        },
        Consumer { rx, cancel: None },
    )
}

/// Create a rendezvous channel whose endpoints are bound to `token`.
pub fn channel_with_cancel<T>(token: &CancelToken) -> (Producer<T>, Consumer<T>) {
    let (producer, consumer) = channel();
    (producer.bind_cancel(token), consumer.bind_cancel(token))
}

/// The single owning, sending end of a channel.
pub struct Producer<T> {
    tx: Sender<T>,
    cancel: Option<CancelToken>,
    closed: bool,
}

impl<T> Producer<T> {
    /// Bind this endpoint to `token`, replacing any previous binding.
    pub fn bind_cancel(mut self, token: &CancelToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }

    /// Send one value, blocking until a consumer takes it.
    pub fn send(&self, value: T) -> PipelineResult<()> {
        let Some(token) = &self.cancel else {
            return self.tx.send(value).map_err(|_| PipelineError::Disconnected);
        };
        if token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        select! {
            send(self.tx, value) -> res => res.map_err(|_| {
                if token.is_cancelled() {
                    PipelineError::Cancelled
                } else {
                    PipelineError::Disconnected
                }
            }),
            recv(token.signal()) -> _ => Err(PipelineError::Cancelled),
        }
    }

    /// Send every value from `values`, then close. Returns how many were sent.
    pub fn send_all<I>(self, values: I) -> PipelineResult<u64>
    where
        I: IntoIterator<Item = T>,
    {
        let mut sent = 0;
        for value in values {
            self.send(value)?;
            sent += 1;
        }
        self.close();
        Ok(sent)
    }

    /// Close the channel. Consumers drain and then observe end of stream.
    pub fn close(mut self) {
        self.closed = true;
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Some(token) = &self.cancel {
            if !token.is_cancelled() {
                tracing::warn!("Producer dropped without closing; cancelling pipeline");
            }
            token.cancel();
        }
    }
}

impl<T> std::fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("bound", &self.cancel.is_some())
            .finish()
    }
}

/// A receiving end of a channel. Cloning yields another consumer of the
/// same stream; each value goes to exactly one of them.
pub struct Consumer<T> {
    rx: Receiver<T>,
    cancel: Option<CancelToken>,
}

impl<T> Consumer<T> {
    /// Bind this endpoint to `token`, replacing any previous binding.
    pub fn bind_cancel(mut self, token: &CancelToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }

    /// Receive one value.
    ///
    /// Returns `Ok(None)` once the producer has closed the channel.
    pub fn recv(&self) -> PipelineResult<Option<T>> {
        let Some(token) = &self.cancel else {
            return Ok(self.rx.recv().ok());
        };
        if token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(value) => Ok(Some(value)),
                // An abandoned producer trips the token before disconnecting.
                Err(_) if token.is_cancelled() => Err(PipelineError::Cancelled),
                Err(_) => Ok(None),
            },
            recv(token.signal()) -> _ => Err(PipelineError::Cancelled),
        }
    }

    /// Receive until the channel closes, collecting every value.
    pub fn drain(&self) -> PipelineResult<Vec<T>> {
        let mut values = Vec::new();
        while let Some(value) = self.recv()? {
            values.push(value);
        }
        Ok(values)
    }
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("bound", &self.cancel.is_some())
            .finish()
    }
}
