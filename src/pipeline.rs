use crate::errors::{AppError, ResultExt};
use crate::followup::{FollowupContext, FollowupGenerator};
use crate::models::{LeadInput, NewLead, ScoringFeatures};
use crate::nlp::NlpFeatureExtractor;
use crate::scoring::LeadScorer;
use std::sync::Arc;

/// Runs a new lead through extraction, scoring and follow-up drafting.
///
/// The steps run one after another; classifier and scoring errors abort the
/// lead, generation errors do not.
#[derive(Clone)]
pub struct LeadPipeline {
    extractor: NlpFeatureExtractor,
    scorer: Arc<dyn LeadScorer>,
    followup: FollowupGenerator,
}

impl LeadPipeline {
    pub fn new(
        extractor: NlpFeatureExtractor,
        scorer: Arc<dyn LeadScorer>,
        followup: FollowupGenerator,
    ) -> Self {
        Self {
            extractor,
            scorer,
            followup,
        }
    }

    pub async fn process(&self, input: LeadInput) -> Result<NewLead, AppError> {
        let nlp = self
            .extractor
            .extract(&input.message)
            .await
            .context("Failed to extract message signals")?;

        let features = ScoringFeatures::new(&input, &nlp);
        let score = self
            .scorer
            .score(&features)
            .with_context(|| format!("Failed to score lead '{}'", input.name))?;
        tracing::info!(
            "Lead '{}' scored {:.2} (sentiment {:.2}, intent {})",
            input.name,
            score,
            nlp.sentiment_score,
            nlp.intent_detected
        );

        let followup = self
            .followup
            .generate(
                &FollowupContext::from(&input),
                score,
                nlp.sentiment_score,
                nlp.intent_detected,
            )
            .await;

        Ok(NewLead::new(input, nlp, score, followup))
    }
}
