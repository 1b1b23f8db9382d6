//! The single serialization point: a bounded FIFO queue all producers feed
//! and exactly one consumer drains.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::triggers::Trigger;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BusError {
    #[error("action queue is full")]
    Full,

    #[error("action queue is closed")]
    Closed,
}

/// Create a bounded action queue.
///
/// Capacity is small on purpose: the device acts on one thing at a time, so
/// a short backlog is all a producer should ever need.
pub fn bounded(capacity: usize) -> (BusSender, BusReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (BusSender { tx }, BusReceiver { rx })
}

/// Producer handle. Cheap to clone; one per signal source.
#[derive(Clone)]
pub struct BusSender {
    tx: mpsc::Sender<Trigger>,
}

impl BusSender {
    /// Fail-fast enqueue. Never blocks the caller.
    pub fn push(&self, trigger: Trigger) -> Result<(), BusError> {
        self.tx.try_send(trigger).map_err(|err| match err {
            TrySendError::Full(_) => BusError::Full,
            TrySendError::Closed(_) => BusError::Closed,
        })
    }

    /// Enqueue for passive sources: a trigger lost under load is acceptable,
    /// so a full queue only logs a warning.
    pub fn offer(&self, trigger: Trigger) {
        if let Err(err) = self.push(trigger.clone()) {
            log::warn!("dropping {} trigger: {}", trigger.kind(), err);
        }
    }
}

/// Consumer handle. Exactly one exists; it is moved into the executor.
pub struct BusReceiver {
    rx: mpsc::Receiver<Trigger>,
}

impl BusReceiver {
    /// Next trigger in arrival order, or `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<Trigger> {
        self.rx.recv().await
    }
}
