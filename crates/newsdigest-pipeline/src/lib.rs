//! Ingestion, maintenance, and health job bodies.
//!
//! These functions hold the work the scheduler, the API, and the CLI all
//! trigger. They log their own failures so callers can fire and forget.

pub mod error;
pub mod health;
pub mod ingest;
pub mod maintenance;
pub mod retry;

use std::sync::Arc;

use newsdigest_nlp::NlpBackends;
use newsdigest_scraper::PortalClient;
use sqlx::SqlitePool;

pub use error::IngestError;
pub use health::{check_health, memory_snapshot, HealthReport, MemorySnapshot};
pub use ingest::{
    ingest_all_sections, ingest_fetched, ingest_section, IngestReport, RunSummary,
    SectionOutcome, StoredArticle,
};
pub use maintenance::{run_maintenance, MaintenanceReport};
pub use retry::{retry_fixed, RetryPolicy};

/// Shared handles every pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub pool: SqlitePool,
    pub portal: Arc<PortalClient>,
    pub nlp: NlpBackends,
}
