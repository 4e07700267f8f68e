use crate::errors::{AppError, ResultExt};
use crate::models::{Lead, NewLead};
use sqlx::SqlitePool;

const SELECT_LEADS: &str = r#"
SELECT
    id, name, location, industry, job_role, lead_source, lead_quality, company_size,
    age, website_visits, email_opens, time_spent_on_site, click_through_rate,
    past_purchases, inquiry_responses, message, score, score_label,
    sentiment_score, sentiment_label, intent_detected, intent_label, followup
FROM leads
ORDER BY id DESC
"#;

/// Persistence for scored leads. Rows are only ever inserted and listed.
#[derive(Clone)]
pub struct LeadStore {
    pool: SqlitePool,
}

impl LeadStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a scored lead and returns its assigned id.
    pub async fn insert(&self, lead: &NewLead) -> Result<i64, AppError> {
        let p = &lead.profile;
        let result = sqlx::query(
            r#"
            INSERT INTO leads (
                name, location, industry, job_role, lead_source, lead_quality, company_size,
                age, website_visits, email_opens, time_spent_on_site, click_through_rate,
                past_purchases, inquiry_responses, message,
                sentiment_score, intent_detected, score,
                score_label, sentiment_label, intent_label, followup
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&p.name)
        .bind(&p.location)
        .bind(&p.industry)
        .bind(&p.job_role)
        .bind(&p.lead_source)
        .bind(&p.lead_quality)
        .bind(&p.company_size)
        .bind(p.age)
        .bind(p.website_visits)
        .bind(p.email_opens)
        .bind(p.time_spent_on_site)
        .bind(p.click_through_rate)
        .bind(p.past_purchases)
        .bind(p.inquiry_responses)
        .bind(&p.message)
        .bind(lead.sentiment_score)
        .bind(lead.intent_detected)
        .bind(lead.score)
        .bind(lead.score_label.as_str())
        .bind(lead.sentiment_label.as_str())
        .bind(lead.intent_label())
        .bind(&lead.followup)
        .execute(&self.pool)
        .await
        .context("Failed to insert lead")?;

        let id = result.last_insert_rowid();
        tracing::debug!("Stored lead {} ({})", id, p.name);
        Ok(id)
    }

    /// All leads, highest id first.
    pub async fn list_newest_first(&self) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>(SELECT_LEADS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list leads")?;
        Ok(leads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{LeadInput, NlpFeatures};

    fn new_lead(name: &str, score: f64) -> NewLead {
        NewLead::new(
            LeadInput {
                name: name.into(),
                location: "Austin".into(),
                industry: "SaaS".into(),
                job_role: "VP Sales".into(),
                lead_source: "Organic".into(),
                lead_quality: "High".into(),
                company_size: "201-500".into(),
                age: 38,
                website_visits: 9,
                email_opens: 5,
                time_spent_on_site: 22.5,
                click_through_rate: 0.3,
                past_purchases: 1,
                inquiry_responses: 2,
                message: "Can we get a demo?".into(),
            },
            NlpFeatures {
                sentiment_score: 0.91,
                intent_detected: true,
            },
            score,
            format!("Hi {}", name),
        )
    }

    async fn store() -> LeadStore {
        let db = Database::new("sqlite::memory:").await.unwrap();
        LeadStore::new(db.pool)
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = store().await;
        let first = store.insert(&new_lead("a", 10.0)).await.unwrap();
        let second = store.insert(&new_lead("b", 20.0)).await.unwrap();
        assert_eq!(second, first + 1);
    }

    #[tokio::test]
    async fn test_list_newest_first_with_all_fields() {
        let store = store().await;
        store.insert(&new_lead("first", 35.0)).await.unwrap();
        store.insert(&new_lead("second", 71.0)).await.unwrap();

        let leads = store.list_newest_first().await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].name, "second");
        assert!(leads[0].id > leads[1].id);

        let top = &leads[0];
        assert_eq!(top.score, 71.0);
        assert_eq!(top.score_label, "Hot");
        assert_eq!(top.sentiment_score, 0.91);
        assert_eq!(top.sentiment_label, "POSITIVE");
        assert!(top.intent_detected);
        assert_eq!(top.intent_label, "Yes");
        assert_eq!(top.followup, "Hi second");
        assert_eq!(top.time_spent_on_site, 22.5);
        assert!(top.created_at.is_none());
        assert_eq!(leads[1].score_label, "Cold");
    }
}
