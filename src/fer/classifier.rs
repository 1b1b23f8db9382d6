//! Classifier seam and the HTTP sidecar client feeding the detector.

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{Emotion, EmotionSample, FrustrationDetector};
use crate::bus::BusSender;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// The camera-plus-model collaborator, reduced to its interface: one call,
/// one classified frame.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classify the current camera frame. `None` means no face was visible.
    async fn classify(&self) -> Result<Option<EmotionSample>, ClassifierError>;
}

/// Wire document returned by the FER sidecar. `label` is absent when no
/// face was found in the frame.
#[derive(Debug, Deserialize)]
struct Classification {
    label: Option<String>,
    #[serde(default)]
    confidence: f32,
}

impl Classification {
    fn into_sample(self, at: Instant) -> Option<EmotionSample> {
        let label = self.label?;
        // Unknown labels are treated as neutral, which resets the detector.
        let emotion = Emotion::from_str(&label).unwrap_or(Emotion::Neutral);
        Some(EmotionSample {
            emotion,
            confidence: self.confidence,
            at,
        })
    }
}

/// Polls a facial-emotion-recognition sidecar over HTTP.
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, url }
    }
}

#[async_trait]
impl EmotionClassifier for HttpClassifier {
    async fn classify(&self) -> Result<Option<EmotionSample>, ClassifierError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let doc: Classification = response.json().await?;
        Ok(doc.into_sample(Instant::now()))
    }
}

/// Producer task: poll the classifier on a fixed cadence, run the detector,
/// push any trigger onto the bus. Drop-on-full; a frustration trigger lost
/// under load is acceptable.
pub async fn run(
    classifier: Arc<dyn EmotionClassifier>,
    mut detector: FrustrationDetector,
    bus: BusSender,
    interval: Duration,
    shutdown: CancellationToken,
) {
    log::info!("📷 Emotion source started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                match classifier.classify().await {
                    Ok(Some(sample)) => {
                        if let Some(trigger) = detector.observe(&sample) {
                            bus.offer(trigger);
                        }
                    }
                    // No face in the frame: not a sample, streak untouched.
                    Ok(None) => {}
                    Err(err) => {
                        log::warn!("Classifier poll failed: {}", err);
                        // Avoid a tight error loop when the sidecar is down.
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                    }
                }
            }
        }
    }

    log::info!("📷 Emotion source stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_label_maps_to_emotion() {
        let doc = Classification {
            label: Some("angry".to_string()),
            confidence: 0.93,
        };
        let sample = doc.into_sample(Instant::now()).unwrap();
        assert_eq!(sample.emotion, Emotion::Angry);
        assert_eq!(sample.confidence, 0.93);
    }

    #[test]
    fn test_unknown_label_becomes_neutral() {
        let doc = Classification {
            label: Some("perplexed".to_string()),
            confidence: 0.8,
        };
        let sample = doc.into_sample(Instant::now()).unwrap();
        assert_eq!(sample.emotion, Emotion::Neutral);
    }

    #[test]
    fn test_missing_label_means_no_face() {
        let doc = Classification {
            label: None,
            confidence: 0.0,
        };
        assert!(doc.into_sample(Instant::now()).is_none());
    }
}
