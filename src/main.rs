use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_scoring_api::api::build_router;
use lead_scoring_api::api::handlers::AppState;
use lead_scoring_api::config::Config;
use lead_scoring_api::core::nlp::NlpFeatureExtractor;
use lead_scoring_api::core::pipeline::LeadPipeline;
use lead_scoring_api::core::scoring::ScoringPipeline;
use lead_scoring_api::db::Database;
use lead_scoring_api::followup::FollowupGenerator;
use lead_scoring_api::integrations::chat::load_chat_model;
use lead_scoring_api::integrations::inference_client::HuggingFaceInferenceClient;
use lead_scoring_api::lead_store::LeadStore;

/// Main entry point for the application.
///
/// Initializes logging, configuration, the sqlite store, the hosted
/// classifiers, the scoring artifacts and the chat model, then starts the
/// Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_scoring_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database ready: {}", config.database_url);

    // Load models
    let scorer = ScoringPipeline::load(&config.preprocessor_path, &config.model_path)?;

    let classifier = Arc::new(HuggingFaceInferenceClient::new(&config)?);
    tracing::info!(
        "✓ Inference client initialized: {}",
        config.inference_base_url
    );
    let extractor = NlpFeatureExtractor::new(classifier.clone(), classifier)
        .with_threshold(config.intent_threshold)
        .with_debug(config.nlp_debug);

    // A missing chat model only degrades follow-ups to the fallback text
    let followup = FollowupGenerator::new(load_chat_model(&config));

    // Build application state
    let app_state = Arc::new(AppState {
        store: LeadStore::new(db.pool.clone()),
        pipeline: LeadPipeline::new(extractor, Arc::new(scorer), followup),
    });

    let app = build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
