use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============ Request / Response Models ============

/// Lead payload accepted by `POST /add_lead`. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadInput {
    pub name: String,
    pub location: String,
    pub industry: String,
    pub job_role: String,
    pub lead_source: String,
    pub lead_quality: String,
    pub company_size: String,
    pub age: i64,
    pub website_visits: i64,
    pub email_opens: i64,
    pub time_spent_on_site: f64,
    pub click_through_rate: f64,
    pub past_purchases: i64,
    pub inquiry_responses: i64,
    pub message: String,
}

/// Response body of `POST /add_lead`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddLeadResponse {
    pub message: String,
    pub lead_score: f64,
}

// ============ Derived Signals ============

/// Signals derived from a lead's free-text message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlpFeatures {
    /// Classifier confidence, negated for negative polarity. Always within [-1, 1].
    pub sentiment_score: f64,
    pub intent_detected: bool,
}

/// Model input: the profile without the message, plus the NLP signals.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringFeatures {
    pub name: String,
    pub location: String,
    pub industry: String,
    pub job_role: String,
    pub lead_source: String,
    pub lead_quality: String,
    pub company_size: String,
    pub age: i64,
    pub website_visits: i64,
    pub email_opens: i64,
    pub time_spent_on_site: f64,
    pub click_through_rate: f64,
    pub past_purchases: i64,
    pub inquiry_responses: i64,
    pub sentiment_score: f64,
    pub intent_detected: bool,
}

/// A single column value as seen by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Numeric(f64),
    Categorical(&'a str),
}

impl ScoringFeatures {
    pub fn new(input: &LeadInput, nlp: &NlpFeatures) -> Self {
        Self {
            name: input.name.clone(),
            location: input.location.clone(),
            industry: input.industry.clone(),
            job_role: input.job_role.clone(),
            lead_source: input.lead_source.clone(),
            lead_quality: input.lead_quality.clone(),
            company_size: input.company_size.clone(),
            age: input.age,
            website_visits: input.website_visits,
            email_opens: input.email_opens,
            time_spent_on_site: input.time_spent_on_site,
            click_through_rate: input.click_through_rate,
            past_purchases: input.past_purchases,
            inquiry_responses: input.inquiry_responses,
            sentiment_score: nlp.sentiment_score,
            intent_detected: nlp.intent_detected,
        }
    }

    /// Looks up a column by name. `intent_detected` is exposed as 0/1.
    pub fn value(&self, column: &str) -> Option<FeatureValue<'_>> {
        use FeatureValue::{Categorical, Numeric};

        let value = match column {
            "name" => Categorical(&self.name),
            "location" => Categorical(&self.location),
            "industry" => Categorical(&self.industry),
            "job_role" => Categorical(&self.job_role),
            "lead_source" => Categorical(&self.lead_source),
            "lead_quality" => Categorical(&self.lead_quality),
            "company_size" => Categorical(&self.company_size),
            "age" => Numeric(self.age as f64),
            "website_visits" => Numeric(self.website_visits as f64),
            "email_opens" => Numeric(self.email_opens as f64),
            "time_spent_on_site" => Numeric(self.time_spent_on_site),
            "click_through_rate" => Numeric(self.click_through_rate),
            "past_purchases" => Numeric(self.past_purchases as f64),
            "inquiry_responses" => Numeric(self.inquiry_responses as f64),
            "sentiment_score" => Numeric(self.sentiment_score),
            "intent_detected" => Numeric(if self.intent_detected { 1.0 } else { 0.0 }),
            _ => return None,
        };
        Some(value)
    }
}

// ============ Labels ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreLabel {
    Hot,
    Warm,
    Cold,
}

impl ScoreLabel {
    /// `> 70` is Hot, `(40, 70]` is Warm, everything else (including NaN) is Cold.
    pub fn from_score(score: f64) -> Self {
        if score > 70.0 {
            ScoreLabel::Hot
        } else if score > 40.0 {
            ScoreLabel::Warm
        } else {
            ScoreLabel::Cold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreLabel::Hot => "Hot",
            ScoreLabel::Warm => "Warm",
            ScoreLabel::Cold => "Cold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
}

impl SentimentLabel {
    /// Zero is not positive.
    pub fn from_score(sentiment_score: f64) -> Self {
        if sentiment_score > 0.0 {
            SentimentLabel::Positive
        } else {
            SentimentLabel::Negative
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, SentimentLabel::Positive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
        }
    }
}

pub fn intent_label(intent_detected: bool) -> &'static str {
    if intent_detected {
        "Yes"
    } else {
        "No"
    }
}

// ============ Database Models ============

/// A fully scored lead ready to be persisted. Every derived field is mandatory.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub profile: LeadInput,
    pub sentiment_score: f64,
    pub intent_detected: bool,
    pub score: f64,
    pub score_label: ScoreLabel,
    pub sentiment_label: SentimentLabel,
    pub followup: String,
}

impl NewLead {
    /// Assembles the record and derives the stored labels from the raw signals.
    pub fn new(profile: LeadInput, nlp: NlpFeatures, score: f64, followup: String) -> Self {
        Self {
            profile,
            sentiment_score: nlp.sentiment_score,
            intent_detected: nlp.intent_detected,
            score,
            score_label: ScoreLabel::from_score(score),
            sentiment_label: SentimentLabel::from_score(nlp.sentiment_score),
            followup,
        }
    }

    pub fn intent_label(&self) -> &'static str {
        intent_label(self.intent_detected)
    }
}

/// A row of the `leads` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub industry: String,
    pub job_role: String,
    pub lead_source: String,
    pub lead_quality: String,
    pub company_size: String,
    pub age: i64,
    pub website_visits: i64,
    pub email_opens: i64,
    pub time_spent_on_site: f64,
    pub click_through_rate: f64,
    pub past_purchases: i64,
    pub inquiry_responses: i64,
    pub message: String,
    pub score: f64,
    pub score_label: String,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub intent_detected: bool,
    pub intent_label: String,
    pub followup: String,
    /// The table has no creation-time column, so this is always null.
    #[sqlx(default)]
    pub created_at: Option<DateTime<Utc>>,
}
