//! Message signals: signed sentiment and purchase intent.
//!
//! The classifiers themselves are external; this module only turns their
//! raw predictions into the two features the scoring model consumes.

use crate::errors::AppError;
use crate::models::NlpFeatures;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Candidate labels passed to the zero-shot classifier, in this order.
pub const INTENT_CANDIDATE_LABELS: [&str; 6] = [
    "ready to buy",
    "interested",
    "just exploring",
    "not interested",
    "complaint",
    "needs support",
];

/// Labels that count as purchase intent.
pub const BUYING_INTENT_LABELS: [&str; 2] = ["interested", "ready to buy"];

pub const DEFAULT_INTENT_THRESHOLD: f64 = 0.6;

/// Top prediction of a binary sentiment classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPrediction {
    pub label: String,
    pub score: f64,
}

impl SentimentPrediction {
    pub fn is_positive(&self) -> bool {
        self.label.eq_ignore_ascii_case("POSITIVE")
    }

    /// Confidence signed by polarity, clamped to [-1, 1].
    pub fn signed_score(&self) -> f64 {
        let confidence = if self.score.is_nan() {
            0.0
        } else {
            self.score.clamp(0.0, 1.0)
        };
        if self.is_positive() {
            confidence
        } else {
            -confidence
        }
    }
}

/// Zero-shot output: labels in the classifier's ranked order with their scores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZeroShotPrediction {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl ZeroShotPrediction {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
    }
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify_sentiment(&self, text: &str) -> Result<SentimentPrediction, AppError>;
}

#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    async fn classify_zero_shot(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<ZeroShotPrediction, AppError>;
}

/// Scans the ranked labels and stops at the first buying-intent label scoring
/// at least `threshold`.
pub fn detect_intent(prediction: &ZeroShotPrediction, threshold: f64) -> bool {
    for (label, score) in prediction.iter() {
        if BUYING_INTENT_LABELS.contains(&label) && score >= threshold {
            return true;
        }
    }
    false
}

#[derive(Clone)]
pub struct NlpFeatureExtractor {
    sentiment: Arc<dyn SentimentClassifier>,
    intent: Arc<dyn ZeroShotClassifier>,
    intent_threshold: f64,
    debug: bool,
}

impl NlpFeatureExtractor {
    pub fn new(
        sentiment: Arc<dyn SentimentClassifier>,
        intent: Arc<dyn ZeroShotClassifier>,
    ) -> Self {
        Self {
            sentiment,
            intent,
            intent_threshold: DEFAULT_INTENT_THRESHOLD,
            debug: false,
        }
    }

    pub fn with_threshold(mut self, intent_threshold: f64) -> Self {
        self.intent_threshold = intent_threshold;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Runs both classifiers on `message`. Classifier errors are returned as is.
    pub async fn extract(&self, message: &str) -> Result<NlpFeatures, AppError> {
        let sentiment = self.sentiment.classify_sentiment(message).await?;
        let sentiment_score = sentiment.signed_score();

        let intent = self
            .intent
            .classify_zero_shot(message, &INTENT_CANDIDATE_LABELS)
            .await?;
        let intent_detected = detect_intent(&intent, self.intent_threshold);

        if self.debug {
            trace_features(message, &sentiment, sentiment_score, &intent, intent_detected);
        }

        Ok(NlpFeatures {
            sentiment_score,
            intent_detected,
        })
    }
}

fn trace_features(
    message: &str,
    sentiment: &SentimentPrediction,
    sentiment_score: f64,
    intent: &ZeroShotPrediction,
    intent_detected: bool,
) {
    tracing::info!(message = %message, "NLP message");
    tracing::info!(
        label = %sentiment.label,
        score = %format_args!("{:.2}", sentiment_score),
        "NLP sentiment"
    );
    for (label, score) in intent.iter() {
        tracing::info!(label = %label, score = %format_args!("{:.2}", score), "NLP intent score");
    }
    if intent_detected {
        tracing::info!(intent_detected, "Intent detected");
    } else {
        tracing::info!(intent_detected, "Intent not detected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedSentiment(SentimentPrediction);

    #[async_trait]
    impl SentimentClassifier for FixedSentiment {
        async fn classify_sentiment(&self, _text: &str) -> Result<SentimentPrediction, AppError> {
            Ok(self.0.clone())
        }
    }

    struct RecordingZeroShot {
        prediction: ZeroShotPrediction,
        seen_labels: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ZeroShotClassifier for RecordingZeroShot {
        async fn classify_zero_shot(
            &self,
            _text: &str,
            candidate_labels: &[&str],
        ) -> Result<ZeroShotPrediction, AppError> {
            *self.seen_labels.lock().unwrap() =
                candidate_labels.iter().map(|l| l.to_string()).collect();
            Ok(self.prediction.clone())
        }
    }

    struct FailingSentiment;

    #[async_trait]
    impl SentimentClassifier for FailingSentiment {
        async fn classify_sentiment(&self, _text: &str) -> Result<SentimentPrediction, AppError> {
            Err(AppError::ExternalApiError("model loading".into()))
        }
    }

    fn prediction(pairs: &[(&str, f64)]) -> ZeroShotPrediction {
        ZeroShotPrediction {
            labels: pairs.iter().map(|(l, _)| l.to_string()).collect(),
            scores: pairs.iter().map(|(_, s)| *s).collect(),
        }
    }

    #[test]
    fn test_signed_score_follows_polarity() {
        let pos = SentimentPrediction {
            label: "POSITIVE".into(),
            score: 0.93,
        };
        let neg = SentimentPrediction {
            label: "NEGATIVE".into(),
            score: 0.81,
        };
        assert_eq!(pos.signed_score(), 0.93);
        assert_eq!(neg.signed_score(), -0.81);
    }

    #[test]
    fn test_signed_score_is_clamped() {
        let odd = SentimentPrediction {
            label: "NEGATIVE".into(),
            score: 1.7,
        };
        assert_eq!(odd.signed_score(), -1.0);
    }

    #[test]
    fn test_detect_intent_threshold_is_inclusive() {
        let p = prediction(&[("interested", 0.6), ("complaint", 0.4)]);
        assert!(detect_intent(&p, 0.6));
        assert!(!detect_intent(&p, 0.61));
    }

    #[test]
    fn test_detect_intent_ignores_other_labels() {
        let p = prediction(&[("complaint", 0.95), ("ready to buy", 0.05)]);
        assert!(!detect_intent(&p, 0.6));
    }

    #[test]
    fn test_detect_intent_accepts_ready_to_buy() {
        let p = prediction(&[("ready to buy", 0.72), ("interested", 0.2)]);
        assert!(detect_intent(&p, 0.6));
    }

    #[test]
    fn test_detect_intent_empty_prediction() {
        assert!(!detect_intent(&ZeroShotPrediction::default(), 0.6));
    }

    #[tokio::test]
    async fn test_extract_combines_both_classifiers() {
        let zero_shot = Arc::new(RecordingZeroShot {
            prediction: prediction(&[("interested", 0.7), ("just exploring", 0.2)]),
            seen_labels: Mutex::new(Vec::new()),
        });
        let extractor = NlpFeatureExtractor::new(
            Arc::new(FixedSentiment(SentimentPrediction {
                label: "POSITIVE".into(),
                score: 0.9,
            })),
            zero_shot.clone(),
        )
        .with_debug(true);

        let features = extractor.extract("Looks great, send pricing").await.unwrap();

        assert_eq!(features.sentiment_score, 0.9);
        assert!(features.intent_detected);
        assert_eq!(
            *zero_shot.seen_labels.lock().unwrap(),
            INTENT_CANDIDATE_LABELS
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_extract_uses_custom_threshold() {
        let extractor = NlpFeatureExtractor::new(
            Arc::new(FixedSentiment(SentimentPrediction {
                label: "NEGATIVE".into(),
                score: 0.55,
            })),
            Arc::new(RecordingZeroShot {
                prediction: prediction(&[("interested", 0.7)]),
                seen_labels: Mutex::new(Vec::new()),
            }),
        )
        .with_threshold(0.8);

        let features = extractor.extract("maybe later").await.unwrap();

        assert_eq!(features.sentiment_score, -0.55);
        assert!(!features.intent_detected);
    }

    #[tokio::test]
    async fn test_extract_propagates_classifier_error() {
        let extractor = NlpFeatureExtractor::new(
            Arc::new(FailingSentiment),
            Arc::new(RecordingZeroShot {
                prediction: ZeroShotPrediction::default(),
                seen_labels: Mutex::new(Vec::new()),
            }),
        );

        let result = extractor.extract("hello").await;
        assert!(matches!(result, Err(AppError::ExternalApiError(_))));
    }
}
