/// Integration tests with mocked hosted models
/// Exercises the real HTTP clients without hitting Hugging Face
use lead_scoring_api::config::Config;
use lead_scoring_api::followup::{
    load_chat_model, ChatModel, FollowupContext, FollowupGenerator, HuggingFaceChatClient,
    FALLBACK_FOLLOWUP,
};
use lead_scoring_api::inference_client::HuggingFaceInferenceClient;
use lead_scoring_api::nlp::{NlpFeatureExtractor, SentimentClassifier, ZeroShotClassifier};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(base_url: String, token: Option<&str>) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 8000,
        hf_token: token.map(str::to_string),
        inference_base_url: base_url.clone(),
        sentiment_model: "sentiment-model".to_string(),
        intent_model: "intent-model".to_string(),
        intent_threshold: 0.6,
        nlp_debug: false,
        chat_base_url: base_url,
        followup_model: "chat-model".to_string(),
        followup_max_tokens: 128,
        preprocessor_path: "Models/preprocessor.json".to_string(),
        model_path: "Models/lead_scoring_model.json".to_string(),
    }
}

#[tokio::test]
async fn test_sentiment_request_and_parse() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/sentiment-model"))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_partial_json(serde_json::json!({"inputs": "Love it"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([[
            {"label": "POSITIVE", "score": 0.98},
            {"label": "NEGATIVE", "score": 0.02}
        ]])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), Some("hf_test"));
    let client = HuggingFaceInferenceClient::new(&config).unwrap();

    let prediction = client.classify_sentiment("Love it").await.unwrap();
    assert_eq!(prediction.label, "POSITIVE");
    assert_eq!(prediction.signed_score(), 0.98);
}

#[tokio::test]
async fn test_zero_shot_sends_candidate_labels() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/intent-model"))
        .and(body_partial_json(serde_json::json!({
            "parameters": {"candidate_labels": ["ready to buy", "interested"]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sequence": "Send me a quote",
            "labels": ["ready to buy", "interested"],
            "scores": [0.85, 0.15]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), None);
    let client = HuggingFaceInferenceClient::new(&config).unwrap();

    let prediction = client
        .classify_zero_shot("Send me a quote", &["ready to buy", "interested"])
        .await
        .unwrap();
    assert_eq!(prediction.labels, vec!["ready to buy", "interested"]);
    assert_eq!(prediction.scores, vec![0.85, 0.15]);
}

#[tokio::test]
async fn test_extractor_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/sentiment-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([[
            {"label": "NEGATIVE", "score": 0.7}
        ]])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/intent-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "labels": ["complaint", "interested", "ready to buy"],
            "scores": [0.3, 0.65, 0.05]
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), Some("hf_test"));
    let client = Arc::new(HuggingFaceInferenceClient::new(&config).unwrap());
    let extractor = NlpFeatureExtractor::new(client.clone(), client).with_debug(true);

    let features = extractor.extract("The price is too high").await.unwrap();
    assert_eq!(features.sentiment_score, -0.7);
    assert!(features.intent_detected);
}

#[tokio::test]
async fn test_inference_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(503).set_body_string(r#"{"error":"Model is loading"}"#),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), None);
    let client = HuggingFaceInferenceClient::new(&config).unwrap();

    assert!(client.classify_sentiment("hello").await.is_err());
    assert!(client
        .classify_zero_shot("hello", &["interested"])
        .await
        .is_err());
}

#[tokio::test]
async fn test_chat_completion_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_partial_json(serde_json::json!({
            "model": "chat-model",
            "max_tokens": 128
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "\n Hi Ada, can we meet Thursday? \n"}
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), Some("hf_test"));
    let chat: Arc<dyn ChatModel> = Arc::new(HuggingFaceChatClient::new(&config).unwrap());
    let generator = FollowupGenerator::new(Some(chat));

    let context = FollowupContext {
        name: Some("Ada"),
        ..Default::default()
    };
    let text = generator.generate(&context, 75.0, 0.4, true).await;
    assert_eq!(text, "Hi Ada, can we meet Thursday?");
}

#[tokio::test]
async fn test_chat_endpoint_failure_returns_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), Some("hf_test"));
    let generator = FollowupGenerator::new(load_chat_model(&config));
    assert!(generator.is_available());

    let text = generator
        .generate(&FollowupContext::default(), 10.0, -0.5, false)
        .await;
    assert_eq!(text, FALLBACK_FOLLOWUP);
}

#[tokio::test]
async fn test_chat_empty_choices_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri(), Some("hf_test"));
    let client = HuggingFaceChatClient::new(&config).unwrap();
    assert!(client.complete("hi").await.is_err());
}

#[test]
fn test_chat_model_requires_token() {
    let config = create_test_config("http://localhost:1".to_string(), None);
    assert!(HuggingFaceChatClient::new(&config).is_err());
    assert!(load_chat_model(&config).is_none());
}
