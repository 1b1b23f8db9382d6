//! Trigger definitions shared by every producer and the executor

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumString};

/// Where a help request originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    Button,
    Network,
}

/// Expressions the on-screen character can show.
///
/// The renderer treats these as opaque identifiers; `neutral` is the resting
/// face the executor returns to after every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Neutral,
    Concerned,
    Listening,
    Happy,
}

/// An immutable request for the executor, placed on the action queue.
///
/// Ownership transfers from the producer to the bus to the single consumer;
/// a trigger is dropped after it has been acted on.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// The frustration detector crossed its threshold.
    Frustration { at: DateTime<Utc> },
    /// The developer asked for help, via the button or over the network.
    HelpRequest { source: TriggerSource },
    /// Speak the supplied text verbatim; no enrichment call needed.
    Speak { text: String },
    /// Only change the displayed expression, no speech.
    Expression { expression: Expression },
}

impl Trigger {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::Frustration { .. } => "frustration",
            Trigger::HelpRequest { .. } => "help-request",
            Trigger::Speak { .. } => "speak",
            Trigger::Expression { .. } => "expression",
        }
    }
}
