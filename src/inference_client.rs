use crate::config::Config;
use crate::errors::AppError;
use crate::nlp::{SentimentClassifier, SentimentPrediction, ZeroShotClassifier, ZeroShotPrediction};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

/// Client for hosted text-classification models on the Hugging Face Inference API.
///
/// Serves both the sentiment classifier and the zero-shot intent classifier.
#[derive(Clone)]
pub struct HuggingFaceInferenceClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    sentiment_model: String,
    intent_model: String,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SentimentResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Ranked { labels: Vec<String>, scores: Vec<f64> },
    Pairs(Vec<LabelScore>),
}

impl HuggingFaceInferenceClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: config.inference_base_url.clone(),
            token: config.hf_token.clone(),
            sentiment_model: config.sentiment_model.clone(),
            intent_model: config.intent_model.clone(),
        })
    }

    async fn infer(&self, model: &str, body: Value) -> Result<Value, AppError> {
        let url = format!("{}/models/{}", self.base_url, model);
        tracing::debug!("Calling inference model {}", model);

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            AppError::ExternalApiError(format!("Inference request to {} failed: {}", model, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Inference model {} returned {}: {}",
                model, status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse {} response: {}", model, e))
        })
    }
}

fn top_label(candidates: Vec<LabelScore>) -> Option<SentimentPrediction> {
    candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|best| SentimentPrediction {
            label: best.label,
            score: best.score,
        })
}

fn parse_sentiment(value: Value) -> Result<SentimentPrediction, AppError> {
    let response: SentimentResponse = serde_json::from_value(value).map_err(|e| {
        AppError::ExternalApiError(format!("Unexpected sentiment response: {}", e))
    })?;

    let candidates = match response {
        SentimentResponse::Nested(mut batches) => {
            if batches.is_empty() {
                Vec::new()
            } else {
                batches.swap_remove(0)
            }
        }
        SentimentResponse::Flat(candidates) => candidates,
    };

    top_label(candidates).ok_or_else(|| {
        AppError::ExternalApiError("Sentiment response contained no labels".to_string())
    })
}

fn parse_zero_shot(value: Value) -> Result<ZeroShotPrediction, AppError> {
    let response: ZeroShotResponse = serde_json::from_value(value).map_err(|e| {
        AppError::ExternalApiError(format!("Unexpected zero-shot response: {}", e))
    })?;

    match response {
        ZeroShotResponse::Ranked { labels, scores } => {
            if labels.len() != scores.len() {
                return Err(AppError::ExternalApiError(format!(
                    "Zero-shot response has {} labels but {} scores",
                    labels.len(),
                    scores.len()
                )));
            }
            Ok(ZeroShotPrediction { labels, scores })
        }
        ZeroShotResponse::Pairs(pairs) => Ok(ZeroShotPrediction {
            labels: pairs.iter().map(|p| p.label.clone()).collect(),
            scores: pairs.iter().map(|p| p.score).collect(),
        }),
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceInferenceClient {
    async fn classify_sentiment(&self, text: &str) -> Result<SentimentPrediction, AppError> {
        let value = self
            .infer(&self.sentiment_model, json!({ "inputs": text }))
            .await?;
        parse_sentiment(value)
    }
}

#[async_trait]
impl ZeroShotClassifier for HuggingFaceInferenceClient {
    async fn classify_zero_shot(
        &self,
        text: &str,
        candidate_labels: &[&str],
    ) -> Result<ZeroShotPrediction, AppError> {
        let body = json!({
            "inputs": text,
            "parameters": { "candidate_labels": candidate_labels }
        });
        let value = self.infer(&self.intent_model, body).await?;
        parse_zero_shot(value)
    }
}
