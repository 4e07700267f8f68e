use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;

const CREATE_LEADS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS leads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name VARCHAR,
    location VARCHAR,
    industry VARCHAR,
    job_role VARCHAR,
    lead_source VARCHAR,
    lead_quality VARCHAR,
    company_size VARCHAR,
    age INTEGER,
    website_visits INTEGER,
    email_opens INTEGER,
    time_spent_on_site FLOAT,
    click_through_rate FLOAT,
    past_purchases INTEGER,
    inquiry_responses INTEGER,
    message TEXT,
    sentiment_score FLOAT,
    intent_detected BOOLEAN,
    score FLOAT,
    score_label VARCHAR,
    sentiment_label VARCHAR,
    intent_label VARCHAR,
    followup TEXT
)
"#;

pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid DATABASE_URL '{}'", database_url))?
            .create_if_missing(true);

        // Every in-memory connection is its own database, so keep exactly one alive.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(10)
                .connect_with(options)
                .await?
        };

        sqlx::query(CREATE_LEADS_TABLE)
            .execute(&pool)
            .await
            .context("creating leads table")?;

        Ok(Self { pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_has_leads_table() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_schema_creation_is_idempotent() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        sqlx::query(CREATE_LEADS_TABLE)
            .execute(&db.pool)
            .await
            .unwrap();
    }
}
