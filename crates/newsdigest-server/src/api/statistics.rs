use axum::{extract::State, Extension, Json};
use chrono::Utc;
use newsdigest_db::ArticleStatistics;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Days of history included in `daily_counts`.
pub(crate) const STATISTICS_DAYS: i64 = 30;

/// GET /api/v1/statistics
pub(super) async fn get_statistics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ArticleStatistics>>, ApiError> {
    let stats =
        newsdigest_db::article_statistics(&state.pool, Utc::now().date_naive(), STATISTICS_DAYS)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: stats,
        meta: ResponseMeta::new(req_id.0),
    }))
}
