//! Shared device state: one writer (the executor), snapshot readers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use tokio::sync::watch;

use crate::triggers::Expression;

/// Where the device is in its action cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Waiting for the next trigger.
    Idle,
    /// An enrichment call is in flight.
    Pending,
    /// Audio output is in progress.
    Speaking,
}

/// The single mutable record describing the device.
///
/// Invariants: `mode` only moves through the executor's state machine,
/// `speaking_text` is populated exactly while `mode` is `Speaking`, and
/// `last_action_at` never decreases.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceState {
    pub mode: Mode,
    pub expression: Expression,
    pub speaking_text: Option<String>,
    pub last_action_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            mode: Mode::Idle,
            expression: Expression::Neutral,
            speaking_text: None,
            last_action_at: None,
            last_error: None,
        }
    }
}

/// Create the state channel. The writer goes to the executor, the reader is
/// cloned into anything that reports status.
pub fn channel() -> (StateWriter, StateReader) {
    let (tx, rx) = watch::channel(DeviceState::default());
    (StateWriter { tx }, StateReader { rx })
}

/// Write handle. Exactly one exists for the process lifetime.
pub struct StateWriter {
    tx: watch::Sender<DeviceState>,
}

impl StateWriter {
    /// Apply a mutation and publish the new state to all readers atomically.
    pub fn update(&self, mutate: impl FnOnce(&mut DeviceState)) {
        self.tx.send_modify(mutate);
    }

    pub fn reader(&self) -> StateReader {
        StateReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read handle. `snapshot` returns an owned copy, so callers never observe a
/// state mid-transition.
#[derive(Clone)]
pub struct StateReader {
    rx: watch::Receiver<DeviceState>,
}

impl StateReader {
    pub fn snapshot(&self) -> DeviceState {
        self.rx.borrow().clone()
    }

    /// Wait until the writer publishes again. Errors once the writer is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle_and_neutral() {
        let (_writer, reader) = channel();
        let state = reader.snapshot();
        assert_eq!(state.mode, Mode::Idle);
        assert_eq!(state.expression, Expression::Neutral);
        assert!(state.speaking_text.is_none());
        assert!(state.last_action_at.is_none());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_snapshot_is_detached_from_later_writes() {
        let (writer, reader) = channel();
        let before = reader.snapshot();

        writer.update(|s| {
            s.mode = Mode::Speaking;
            s.speaking_text = Some("quack".to_string());
        });

        assert_eq!(before.mode, Mode::Idle);
        let after = reader.snapshot();
        assert_eq!(after.mode, Mode::Speaking);
        assert_eq!(after.speaking_text.as_deref(), Some("quack"));
    }

    #[test]
    fn test_mode_serializes_uppercase() {
        let json = serde_json::to_string(&Mode::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
        assert_eq!(Mode::Speaking.to_string(), "SPEAKING");
    }
}
