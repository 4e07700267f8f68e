//! Follow-up drafting through a hosted chat-completion model.

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{LeadInput, ScoreLabel, SentimentLabel};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Returned whenever the generation endpoint cannot produce a message.
pub const FALLBACK_FOLLOWUP: &str = "Sorry, we couldn't generate a follow-up at this time.";

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends a single user prompt and returns the assistant's reply.
    async fn complete(&self, prompt: &str) -> Result<String, AppError>;
}

/// OpenAI-compatible chat-completion client for the Hugging Face router.
#[derive(Clone)]
pub struct HuggingFaceChatClient {
    client: Client,
    base_url: String,
    token: String,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl HuggingFaceChatClient {
    /// Fails when no token is configured.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let token = config
            .hf_token
            .clone()
            .ok_or_else(|| AppError::InternalError("HF_TOKEN is not set".to_string()))?;

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: config.chat_base_url.clone(),
            token,
            model: config.followup_model.clone(),
            max_tokens: config.followup_max_tokens,
        })
    }
}

#[async_trait]
impl ChatModel for HuggingFaceChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        tracing::debug!("Requesting follow-up from {}", self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Chat endpoint returned {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse chat response: {}", e))
        })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::ExternalApiError("Chat response had no content".to_string()))
    }
}

/// Builds the chat client once at startup. A failure is logged and leaves the
/// generator without a model, so every follow-up falls back.
pub fn load_chat_model(config: &Config) -> Option<Arc<dyn ChatModel>> {
    match HuggingFaceChatClient::new(config) {
        Ok(client) => {
            tracing::info!("✓ Connected to chat model: {}", config.followup_model);
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!("Failed to initialize chat model: {}", e);
            None
        }
    }
}

/// Lead attributes the prompt mentions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FollowupContext<'a> {
    pub name: Option<&'a str>,
    pub industry: Option<&'a str>,
    pub job_role: Option<&'a str>,
    pub company_size: Option<&'a str>,
}

// Every profile field is required in the request body, so a blank string is
// the only way a lead can lack one. It gets the fallback wording instead of an
// empty slot in the prompt.
fn present(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl<'a> From<&'a LeadInput> for FollowupContext<'a> {
    fn from(lead: &'a LeadInput) -> Self {
        Self {
            name: present(&lead.name),
            industry: present(&lead.industry),
            job_role: present(&lead.job_role),
            company_size: present(&lead.company_size),
        }
    }
}

pub fn build_followup_prompt(
    lead: &FollowupContext<'_>,
    score: f64,
    sentiment_score: f64,
    intent_detected: bool,
) -> String {
    let name = lead.name.unwrap_or("there");
    let industry = lead.industry.unwrap_or("an unspecified industry");
    let job_role = lead.job_role.unwrap_or("a potential customer");
    let company_size = lead.company_size.unwrap_or("an unknown-sized company");

    let score_label = ScoreLabel::from_score(score).as_str();
    let sentiment_label = if SentimentLabel::from_score(sentiment_score).is_positive() {
        "positive"
    } else {
        "neutral/negative"
    };
    let intent_label = if intent_detected { "strong" } else { "unclear" };

    format!(
        "Write a professional, concise follow-up email for a potential lead.

Lead Info:
- Name: {name}
- Industry: {industry}
- Role: {job_role}
- Company Size: {company_size}
- Lead Score: {score:.2} ({score_label})
- Sentiment: {sentiment_label}
- Intent: {intent_label}

Requirements:
- Keep it professional and personalized
- Maximum 3-4 sentences
- No hashtags, no promotional text
- No extra formatting or tags
- End with a clear call to action"
    )
}

#[derive(Clone, Default)]
pub struct FollowupGenerator {
    chat: Option<Arc<dyn ChatModel>>,
}

impl FollowupGenerator {
    pub fn new(chat: Option<Arc<dyn ChatModel>>) -> Self {
        Self { chat }
    }

    pub fn is_available(&self) -> bool {
        self.chat.is_some()
    }

    /// Never fails: any generation problem yields [`FALLBACK_FOLLOWUP`].
    pub async fn generate(
        &self,
        lead: &FollowupContext<'_>,
        score: f64,
        sentiment_score: f64,
        intent_detected: bool,
    ) -> String {
        let Some(chat) = self.chat.as_ref() else {
            tracing::error!("Error generating message: no chat model configured");
            return FALLBACK_FOLLOWUP.to_string();
        };

        let prompt = build_followup_prompt(lead, score, sentiment_score, intent_detected);
        match chat.complete(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::error!("Error generating message: {}", e);
                FALLBACK_FOLLOWUP.to_string()
            }
        }
    }
}
