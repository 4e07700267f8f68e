use crate::dashboard::{render_dashboard, DashboardQuery};
use crate::errors::AppError;
use crate::lead_store::LeadStore;
use crate::models::*;
use crate::pipeline::LeadPipeline;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead persistence.
    pub store: LeadStore,
    /// Extraction, scoring and follow-up for new leads.
    pub pipeline: LeadPipeline,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-scoring-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /
///
/// Renders the HTML dashboard with summary counts and the filtered lead table.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, AppError> {
    tracing::debug!("GET / - query: {:?}", query);

    let leads = state.store.list_newest_first().await?;
    Ok(Html(render_dashboard(&leads, &query)))
}

/// POST /add_lead
///
/// Scores the lead, drafts a follow-up, stores the result and returns the score.
/// Bodies that do not match [`LeadInput`] are rejected with 400 before any of
/// that happens.
pub async fn add_lead(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LeadInput>, JsonRejection>,
) -> Result<Json<AddLeadResponse>, AppError> {
    let Json(input) = payload.map_err(|rejection| {
        tracing::warn!("POST /add_lead - rejected body: {}", rejection.body_text());
        AppError::BadRequest(rejection.body_text())
    })?;
    tracing::info!("POST /add_lead - lead: {}", input.name);

    let lead = state.pipeline.process(input).await?;
    let id = state.store.insert(&lead).await?;

    tracing::info!(
        "Lead {} stored: score {:.2} ({})",
        id,
        lead.score,
        lead.score_label.as_str()
    );

    Ok(Json(AddLeadResponse {
        message: "Lead added".to_string(),
        lead_score: lead.score,
    }))
}

/// GET /leads
///
/// Every stored lead, newest first.
pub async fn list_leads(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Lead>>, AppError> {
    let leads = state.store.list_newest_first().await?;
    tracing::debug!("GET /leads - {} leads", leads.len());
    Ok(Json(leads))
}
