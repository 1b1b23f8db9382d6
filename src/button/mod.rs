//! Hardware help button: debouncing and the GPIO edge source.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::bus::BusSender;
use crate::triggers::{Trigger, TriggerSource};

#[derive(Error, Debug)]
pub enum ButtonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Refractory-window filter over raw rising edges.
///
/// Sub-pulse-width noise is filtered before this layer; this only rejects
/// honest re-presses that arrive too soon after an accepted one.
pub struct ButtonDebouncer {
    refractory: Duration,
    last_accepted: Option<Instant>,
}

impl ButtonDebouncer {
    pub fn new(refractory: Duration) -> Self {
        Self {
            refractory,
            last_accepted: None,
        }
    }

    /// Feed a rising edge; returns a trigger when the edge is accepted.
    pub fn observe(&mut self, at: Instant) -> Option<Trigger> {
        if let Some(prev) = self.last_accepted {
            if at.duration_since(prev) < self.refractory {
                log::debug!("button press ignored (debounce)");
                return None;
            }
        }
        self.last_accepted = Some(at);
        Some(Trigger::HelpRequest {
            source: TriggerSource::Button,
        })
    }
}

/// The GPIO hardware, reduced to its interface: resolves on the next raw
/// rising edge.
#[async_trait]
pub trait ButtonSource: Send {
    async fn next_press(&mut self) -> Result<(), ButtonError>;
}

/// Polls a sysfs GPIO value file for 0→1 transitions.
pub struct SysfsButton {
    path: PathBuf,
    poll_interval: Duration,
    last_level: bool,
}

impl SysfsButton {
    pub fn new(path: PathBuf, poll_interval: Duration) -> Self {
        Self {
            path,
            poll_interval,
            last_level: false,
        }
    }

    async fn read_level(&self) -> Result<bool, ButtonError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(raw.trim() == "1")
    }
}

#[async_trait]
impl ButtonSource for SysfsButton {
    async fn next_press(&mut self) -> Result<(), ButtonError> {
        loop {
            let level = self.read_level().await?;
            let rising = level && !self.last_level;
            self.last_level = level;
            if rising {
                return Ok(());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Producer task: wait for debounced presses and push help requests onto
/// the bus.
pub async fn run(
    mut source: impl ButtonSource,
    mut debouncer: ButtonDebouncer,
    bus: BusSender,
    shutdown: CancellationToken,
) {
    log::info!("🔘 Button listener started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            pressed = source.next_press() => {
                match pressed {
                    Ok(()) => {
                        if let Some(trigger) = debouncer.observe(Instant::now()) {
                            log::info!("🔘 Button pressed");
                            bus.offer(trigger);
                        }
                    }
                    Err(err) => {
                        log::error!("Button source failed: {}", err);
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                    }
                }
            }
        }
    }

    log::info!("🔘 Button listener stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_edges_inside_refractory_produce_one_trigger() {
        let mut debouncer = ButtonDebouncer::new(Duration::from_secs(1));
        let start = Instant::now();

        let first = debouncer.observe(start);
        let second = debouncer.observe(start + Duration::from_millis(200));
        let third = debouncer.observe(start + Duration::from_millis(900));

        assert!(matches!(
            first,
            Some(Trigger::HelpRequest {
                source: TriggerSource::Button
            })
        ));
        assert!(second.is_none());
        assert!(third.is_none());
    }

    #[test]
    fn test_spaced_edges_both_accepted() {
        let mut debouncer = ButtonDebouncer::new(Duration::from_secs(1));
        let start = Instant::now();

        assert!(debouncer.observe(start).is_some());
        assert!(debouncer.observe(start + Duration::from_millis(1100)).is_some());
    }

    #[test]
    fn test_refractory_window_restarts_on_acceptance() {
        let mut debouncer = ButtonDebouncer::new(Duration::from_secs(1));
        let start = Instant::now();

        assert!(debouncer.observe(start).is_some());
        // Rejected edges do not extend the window.
        assert!(debouncer.observe(start + Duration::from_millis(700)).is_none());
        assert!(debouncer.observe(start + Duration::from_millis(1050)).is_some());
    }

    #[tokio::test]
    async fn test_sysfs_button_detects_rising_edge() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0").unwrap();

        let mut button = SysfsButton::new(
            file.path().to_path_buf(),
            Duration::from_millis(5),
        );

        let path = file.path().to_path_buf();
        let press = tokio::spawn(async move { button.next_press().await });

        // Flip the line high after a few polls.
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::fs::write(&path, "1\n").await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), press)
            .await
            .expect("no edge seen")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_sysfs_button_ignores_held_level() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1").unwrap();

        let mut button = SysfsButton::new(
            file.path().to_path_buf(),
            Duration::from_millis(5),
        );

        // First read consumes the initial edge.
        button.next_press().await.unwrap();

        // Line stays high: no further edge within the wait window.
        let held = tokio::time::timeout(Duration::from_millis(50), button.next_press()).await;
        assert!(held.is_err());
    }
}
