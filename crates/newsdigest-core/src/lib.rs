//! Shared domain types and configuration for newsdigest.

pub mod app_config;
pub mod config;
pub mod section;
pub mod sentiment;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app_config::{AppConfig, Environment, NlpBackend};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use section::Section;
pub use sentiment::SentimentLabel;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown section: {0}")]
    UnknownSection(String),

    #[error("unknown sentiment label: {0}")]
    UnknownSentimentLabel(String),
}

/// Sentiment classification produced for an article summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Classifier confidence in `[0.0, 1.0]`.
    pub score: f64,
}

/// A fully analysed article ready to be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub section: Section,
    pub title: String,
    pub url: String,
    pub content: String,
    pub summary: Option<String>,
    pub sentiment: Option<Sentiment>,
}

/// A stored article as returned by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub section: Section,
    pub title: String,
    pub url: String,
    pub content: String,
    pub summary: Option<String>,
    pub sentiment: Option<SentimentLabel>,
    pub sentiment_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}
