//! Facial-emotion stream handling: sample types and the frustration detector.

pub mod classifier;

use std::time::{Duration, Instant};

use chrono::Utc;
use strum::{Display, EnumString};

use crate::triggers::Trigger;

pub use classifier::{ClassifierError, EmotionClassifier, HttpClassifier};

/// The classifier's fixed label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
}

/// One classified camera frame. Created per-frame, consumed immediately,
/// never persisted.
#[derive(Debug, Clone, Copy)]
pub struct EmotionSample {
    pub emotion: Emotion,
    /// Classifier confidence in [0, 1].
    pub confidence: f32,
    pub at: Instant,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Consecutive matching samples needed to fire.
    pub threshold: u32,
    /// Samples below this confidence reset the streak.
    pub confidence_floor: f32,
    /// Minimum spacing between two frustration triggers.
    pub cooldown: Duration,
    /// Labels that count as frustration.
    pub frustration_set: Vec<Emotion>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 100,
            confidence_floor: 0.5,
            cooldown: Duration::from_secs(30),
            frustration_set: vec![Emotion::Angry, Emotion::Disgust, Emotion::Sad],
        }
    }
}

/// Sliding counter over the emotion stream.
///
/// A run of `threshold` consecutive negative-affect samples at or above the
/// confidence floor emits one `Trigger::Frustration`; any other sample
/// resets the streak. After firing, the cooldown window suppresses further
/// triggers — samples keep counting during cooldown (the streak saturates at
/// the threshold) so a face that stays frustrated can fire again the moment
/// the window expires.
pub struct FrustrationDetector {
    config: DetectorConfig,
    streak: u32,
    last_fired: Option<Instant>,
}

impl FrustrationDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            streak: 0,
            last_fired: None,
        }
    }

    /// Feed one sample; returns a trigger when the threshold is crossed
    /// outside the cooldown window.
    pub fn observe(&mut self, sample: &EmotionSample) -> Option<Trigger> {
        let matches = sample.confidence >= self.config.confidence_floor
            && self.config.frustration_set.contains(&sample.emotion);

        if !matches {
            if self.streak > 0 {
                log::debug!("frustration streak reset by {} sample", sample.emotion);
            }
            self.streak = 0;
            return None;
        }

        self.streak = (self.streak + 1).min(self.config.threshold);
        log::debug!(
            "frustration streak {}/{}",
            self.streak,
            self.config.threshold
        );

        if self.streak < self.config.threshold {
            return None;
        }

        if let Some(fired) = self.last_fired {
            if sample.at.duration_since(fired) < self.config.cooldown {
                return None;
            }
        }

        self.streak = 0;
        self.last_fired = Some(sample.at);
        log::info!("🔥 frustration threshold reached");
        Some(Trigger::Frustration { at: Utc::now() })
    }
}
