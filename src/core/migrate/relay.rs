//! Bounded relay between the single producer and the worker pool
//!
//! The relay is a bounded `tokio::sync::mpsc` channel whose receiving half is
//! shared by every worker. Dropping or closing the [`RelaySender`] is the only
//! end-of-stream signal; workers see `None` once it is closed and drained.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Creates a relay holding at most `capacity` pending records
pub fn channel<R>(capacity: usize) -> (RelaySender<R>, Relay<R>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        RelaySender { sender },
        Relay {
            receiver: Arc::new(Mutex::new(receiver)),
        },
    )
}

/// Producing half, owned by exactly one producer
#[derive(Debug)]
pub struct RelaySender<R> {
    sender: mpsc::Sender<R>,
}

impl<R> RelaySender<R> {
    /// Pushes a record, blocking the thread while the relay is full
    ///
    /// Fails and returns the record when every consumer has gone away. Must
    /// not be called from inside an async task.
    pub fn blocking_push(&self, record: R) -> Result<(), R> {
        self.sender.blocking_send(record).map_err(|e| e.0)
    }

    /// Closes the relay
    ///
    /// Records already pushed are still delivered.
    pub fn close(self) {
        drop(self);
    }
}

/// Consuming half, cloned once per worker
#[derive(Debug)]
pub struct Relay<R> {
    receiver: Arc<Mutex<mpsc::Receiver<R>>>,
}

impl<R> Clone for Relay<R> {
    fn clone(&self) -> Self {
        Self {
            receiver: Arc::clone(&self.receiver),
        }
    }
}

impl<R> Relay<R> {
    /// Takes the next record, waiting while the relay is empty
    ///
    /// Returns `None` once the relay is closed and drained. Cancelling the
    /// returned future never loses a record.
    pub async fn pop(&self) -> Option<R> {
        self.receiver.lock().await.recv().await
    }
}
