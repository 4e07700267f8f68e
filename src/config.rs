use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub hf_token: Option<String>,
    pub inference_base_url: String,
    pub sentiment_model: String,
    pub intent_model: String,
    pub intent_threshold: f64,
    pub nlp_debug: bool,
    pub chat_base_url: String,
    pub followup_model: String,
    pub followup_max_tokens: u32,
    pub preprocessor_path: String,
    pub model_path: String,
}

fn http_url(var: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(var).unwrap_or_else(|_| default.to_string());
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", var);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", var);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn non_empty(var: &str, default: &str) -> anyhow::Result<String> {
    let value = std::env::var(var).unwrap_or_else(|_| default.to_string());
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", var);
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://leads.db".to_string())
                .trim()
                .to_string(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            hf_token: std::env::var("HF_TOKEN")
                .or_else(|_| std::env::var("hf_token"))
                .ok()
                .filter(|s| !s.trim().is_empty()),
            inference_base_url: http_url(
                "HF_INFERENCE_URL",
                "https://api-inference.huggingface.co",
            )?,
            sentiment_model: non_empty(
                "SENTIMENT_MODEL",
                "distilbert-base-uncased-finetuned-sst-2-english",
            )?,
            intent_model: non_empty("INTENT_MODEL", "facebook/bart-large-mnli")?,
            intent_threshold: std::env::var("INTENT_THRESHOLD")
                .unwrap_or_else(|_| "0.6".to_string())
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("INTENT_THRESHOLD must be a number"))
                .and_then(|t| {
                    if !(0.0..=1.0).contains(&t) {
                        anyhow::bail!("INTENT_THRESHOLD must be between 0 and 1");
                    }
                    Ok(t)
                })?,
            nlp_debug: std::env::var("NLP_DEBUG")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(true),
            chat_base_url: http_url("HF_CHAT_URL", "https://router.huggingface.co")?,
            followup_model: non_empty("FOLLOWUP_MODEL", "HuggingFaceH4/zephyr-7b-beta")?,
            followup_max_tokens: std::env::var("FOLLOWUP_MAX_TOKENS")
                .unwrap_or_else(|_| "256".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("FOLLOWUP_MAX_TOKENS must be a positive number"))?,
            preprocessor_path: non_empty("PREPROCESSOR_PATH", "Models/preprocessor.json")?,
            model_path: non_empty("MODEL_PATH", "Models/lead_scoring_model.json")?,
        };

        if !config.database_url.starts_with("sqlite:") {
            anyhow::bail!("DATABASE_URL must start with sqlite:");
        }

        // Log successful configuration load (without the token)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Database URL: {}", config.database_url);
        tracing::debug!("Inference URL: {}", config.inference_base_url);
        tracing::debug!(
            "NLP models: sentiment={}, intent={} (threshold {})",
            config.sentiment_model,
            config.intent_model,
            config.intent_threshold
        );
        tracing::debug!(
            "Follow-up model: {} via {}",
            config.followup_model,
            config.chat_base_url
        );
        if config.hf_token.is_none() {
            tracing::warn!("HF_TOKEN not set; follow-up generation will use the fallback text");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_url_default_and_trailing_slash() {
        let url = http_url("LEAD_TEST_UNSET_URL", "https://example.com/").unwrap();
        assert_eq!(url, "https://example.com");
    }

    #[test]
    fn test_http_url_rejects_other_schemes() {
        std::env::set_var("LEAD_TEST_BAD_URL", "ftp://example.com");
        assert!(http_url("LEAD_TEST_BAD_URL", "https://example.com").is_err());
    }

    #[test]
    fn test_non_empty_rejects_blank() {
        std::env::set_var("LEAD_TEST_BLANK", "   ");
        assert!(non_empty("LEAD_TEST_BLANK", "default").is_err());
        assert_eq!(non_empty("LEAD_TEST_UNSET", "default").unwrap(), "default");
    }
}
