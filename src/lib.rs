//! Lead Scoring API Library
//!
//! Scores inbound leads from their profile and free-text message: hosted
//! classifiers derive sentiment and purchase intent, a pretrained model turns
//! profile plus signals into a score, and a hosted chat model drafts the
//! follow-up. Results are stored in sqlite and served as JSON and HTML.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Lead signals, scoring and follow-up logic.
//! - `integrations`: Hosted model clients.
//! - `app`: Router construction.
//! - `config`: Configuration management.
//! - `dashboard`: HTML dashboard rendering, filters and pagination.
//! - `db`: Database connection and schema.
//! - `errors`: Error handling types.
//! - `followup`: Follow-up prompt and generator.
//! - `handlers`: HTTP request handlers.
//! - `inference_client`: Hugging Face classification client.
//! - `lead_store`: Lead persistence.
//! - `models`: Core data models and labels.
//! - `nlp`: Sentiment and intent extraction.
//! - `pipeline`: Per-lead processing chain.
//! - `scoring`: Preprocessor and scoring model artifacts.

pub mod api;
pub mod core;
pub mod integrations;

pub mod app;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod followup;
pub mod handlers;
pub mod inference_client;
pub mod lead_store;
pub mod models;
pub mod nlp;
pub mod pipeline;
pub mod scoring;
