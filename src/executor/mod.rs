//! The action executor: the single consumer that turns triggers into
//! device-visible effects.
//!
//! Serialization is structural — the executor does not dequeue the next
//! trigger until the current action has fully completed, so no two spoken
//! actions can ever overlap and state transitions need no locking.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::bus::BusReceiver;
use crate::display::DisplayRenderer;
use crate::help::HelpPipeline;
use crate::llm::AdviceGenerator;
use crate::speech::SpeechSynthesizer;
use crate::state::{Mode, StateWriter};
use crate::triggers::{Expression, Trigger, TriggerSource};

/// The collaborators the executor drives. All calls go through these seams;
/// no other component may touch the audio output or the display.
pub struct Collaborators {
    pub advice: Arc<dyn AdviceGenerator>,
    pub help: Arc<dyn HelpPipeline>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub display: Arc<dyn DisplayRenderer>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Upper bound on one enrichment call; exceeding it counts as failure.
    pub enrichment_timeout: Duration,
    /// Upper bound on one synthesis run. On expiry the action is treated as
    /// failed but the underlying playback is not force-terminated.
    pub speech_timeout: Duration,
}

pub struct ActionExecutor {
    bus: BusReceiver,
    state: StateWriter,
    collab: Collaborators,
    config: ExecutorConfig,
}

impl ActionExecutor {
    pub fn new(
        bus: BusReceiver,
        state: StateWriter,
        collab: Collaborators,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            bus,
            state,
            collab,
            config,
        }
    }

    /// Consume triggers one at a time until shutdown or every producer is
    /// gone. No trigger may break this loop: every failure path lands back
    /// in `Idle`.
    pub async fn run(mut self, shutdown: CancellationToken) {
        log::info!("🎬 Action executor started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                trigger = self.bus.next() => {
                    match trigger {
                        Some(trigger) => {
                            log::debug!("handling {} trigger", trigger.kind());
                            self.handle(trigger).await;
                        }
                        None => break,
                    }
                }
            }
        }

        log::info!("🎬 Action executor stopped");
    }

    async fn handle(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Expression { expression } => self.apply_expression(expression),
            Trigger::Speak { text } => self.speak(text, Expression::Listening).await,
            Trigger::Frustration { at } => {
                log::info!("💛 Comforting a frustration detected at {}", at);
                self.enter_pending(Expression::Concerned);
                let call = self.collab.advice.comfort_phrase();
                match timeout(self.config.enrichment_timeout, call).await {
                    Ok(Ok(text)) => self.speak(text, Expression::Concerned).await,
                    Ok(Err(err)) => self.fail_pending(format!("comfort advice failed: {err}")),
                    Err(_) => self.fail_pending("comfort advice timed out".to_string()),
                }
            }
            Trigger::HelpRequest { source } => {
                log::info!("🆘 Help requested via {}", source);
                self.enter_pending(Expression::Listening);
                let call = self.collab.help.request_help();
                match timeout(self.config.enrichment_timeout, call).await {
                    Ok(Ok(text)) => self.speak(text, Expression::Listening).await,
                    Ok(Err(err)) => {
                        self.fail_pending(help_failure_note(source, &err.to_string()))
                    }
                    Err(_) => self.fail_pending(help_failure_note(source, "timed out")),
                }
            }
        }
    }

    /// `Idle` → `Idle`: only the face changes.
    fn apply_expression(&self, expression: Expression) {
        self.collab.display.show(expression);
        self.state.update(|s| {
            s.expression = expression;
            s.last_action_at = Some(Utc::now());
        });
    }

    fn enter_pending(&self, expression: Expression) {
        self.collab.display.show(expression);
        self.state.update(|s| {
            s.mode = Mode::Pending;
            s.expression = expression;
        });
    }

    /// Enrichment failed or timed out: record it and return to `Idle`
    /// without speaking. The next trigger is processed normally.
    fn fail_pending(&self, note: String) {
        log::error!("{}", note);
        self.collab.display.show(Expression::Neutral);
        self.state.update(|s| {
            s.mode = Mode::Idle;
            s.expression = Expression::Neutral;
            s.last_error = Some(note);
        });
    }

    /// `Speaking` phase: blocks this task until synthesis returns, then
    /// lands in `Idle` whatever the outcome.
    async fn speak(&self, text: String, expression: Expression) {
        self.collab.display.show(expression);
        self.state.update(|s| {
            s.mode = Mode::Speaking;
            s.expression = expression;
            s.speaking_text = Some(text.clone());
        });

        let outcome = timeout(self.config.speech_timeout, self.collab.speech.speak(&text)).await;
        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => {
                log::error!("Speech synthesis failed: {}", err);
                Some(format!("speech failed: {err}"))
            }
            Err(_) => {
                // The driver has no cancel primitive; playback may still be
                // draining while the state machine moves on.
                log::warn!("Speech synthesis exceeded its timeout; proceeding to idle");
                Some("speech timed out".to_string())
            }
        };

        self.collab.display.show(Expression::Neutral);
        self.state.update(|s| {
            s.mode = Mode::Idle;
            s.expression = Expression::Neutral;
            s.speaking_text = None;
            s.last_action_at = Some(Utc::now());
            if let Some(error) = error {
                s.last_error = Some(error);
            }
        });
    }
}

fn help_failure_note(source: TriggerSource, detail: &str) -> String {
    format!("help request ({source}) failed: {detail}")
}
