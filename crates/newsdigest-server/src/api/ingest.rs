//! On-demand pipeline runs: single-section ingestion and a maintenance sweep.

use axum::{extract::State, Extension, Json};
use newsdigest_pipeline::{IngestError, IngestReport, MaintenanceReport};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::extract::ApiJson;
use super::{map_db_error, parse_section, ApiError, ApiResponse, AppState, ResponseMeta};

pub(crate) const DEFAULT_INGEST_COUNT: i64 = 10;
pub(crate) const MAX_INGEST_COUNT: i64 = 200;

#[derive(Debug, Deserialize)]
pub(super) struct IngestRequest {
    pub section: String,
    pub count: Option<i64>,
}

/// Validate a requested article count: default 10, allowed 1..=200.
pub(crate) fn validate_count(rid: &str, count: Option<i64>) -> Result<usize, ApiError> {
    let count = count.unwrap_or(DEFAULT_INGEST_COUNT);
    if !(1..=MAX_INGEST_COUNT).contains(&count) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("count must be between 1 and {MAX_INGEST_COUNT}, got {count}"),
        ));
    }
    usize::try_from(count).map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))
}

pub(crate) fn map_ingest_error(rid: String, error: &IngestError) -> ApiError {
    match error {
        IngestError::Db(e) => map_db_error(rid, e),
        IngestError::Scraper(_) | IngestError::NothingFetched { .. } => {
            tracing::warn!(error = %error, "ingestion failed upstream");
            ApiError::new(rid, "upstream_error", error.to_string())
        }
    }
}

/// POST /api/v1/ingest runs the pipeline for one section.
pub(super) async fn run_ingest(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<IngestRequest>,
) -> Result<Json<ApiResponse<IngestReport>>, ApiError> {
    let rid = &req_id.0;
    let section = parse_section(rid, &body.section)?;
    let count = validate_count(rid, body.count)?;

    let report = newsdigest_pipeline::ingest_section(&state.pipeline, section, count)
        .await
        .map_err(|e| map_ingest_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/maintenance runs one maintenance sweep.
pub(super) async fn run_maintenance(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<MaintenanceReport>>, ApiError> {
    let report = newsdigest_pipeline::run_maintenance(&state.pool, &state.pipeline.nlp)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}
