mod articles;
mod extract;
mod ingest;
mod statistics;

pub(crate) use statistics::STATISTICS_DAYS;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use newsdigest_core::{AppConfig, Section};
use newsdigest_pipeline::{MemorySnapshot, PipelineContext};
use serde::Serialize;
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::dashboard;
use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub pipeline: PipelineContext,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<AppConfig>, pipeline: PipelineContext) -> Self {
        Self {
            pool: pipeline.pool.clone(),
            config,
            pipeline,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    memory: Option<MemorySnapshot>,
}

impl ResponseMeta {
    pub(crate) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(crate) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(crate) fn map_db_error(request_id: String, error: &newsdigest_db::DbError) -> ApiError {
    if matches!(error, newsdigest_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "article not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Parse a `section` query or body value, mapping bad input to
/// `validation_error`.
pub(crate) fn parse_section(request_id: &str, raw: &str) -> Result<Section, ApiError> {
    raw.trim().parse::<Section>().map_err(|e| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("{e}; expected one of politics, economy, society, life_culture, world, it_science"),
        )
    })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/articles",
            get(articles::list_articles).post(articles::save_article),
        )
        .route(
            "/api/v1/articles/{id}",
            get(articles::get_article).delete(articles::delete_article),
        )
        .route("/api/v1/statistics", get(statistics::get_statistics))
        .route("/api/v1/ingest", post(ingest::run_ingest))
        .route("/api/v1/maintenance", post(ingest::run_maintenance))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    let mut app = Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit));
    if state.config.dashboard_enabled {
        app = app.merge(dashboard::router());
    }

    app.layer(
        ServiceBuilder::new()
            .layer(build_cors())
            .layer(axum::middleware::from_fn(request_id)),
    )
    .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let report = newsdigest_pipeline::check_health(&state.pool).await;

    if report.is_healthy() {
        (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    memory: report.memory,
                },
                meta,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                data: HealthData {
                    status: "degraded",
                    database: "unavailable",
                    memory: report.memory,
                },
                meta,
            }),
        )
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::env::VarError;
    use std::sync::Arc;

    use newsdigest_core::{build_app_config, AppConfig};
    use newsdigest_nlp::{LeadSummarizer, LexiconClassifier, NlpBackends};
    use newsdigest_pipeline::PipelineContext;
    use newsdigest_scraper::PortalClient;

    use super::AppState;

    pub(crate) fn test_config(portal_base_url: &str, dashboard: bool) -> AppConfig {
        let vars: HashMap<&str, String> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:".to_string()),
            ("NEWSDIGEST_ENV", "test".to_string()),
            ("NEWSDIGEST_API_KEYS", "test-key".to_string()),
            ("NEWSDIGEST_PORTAL_BASE_URL", portal_base_url.to_string()),
            (
                "NEWSDIGEST_DASHBOARD_ENABLED",
                if dashboard { "true" } else { "false" }.to_string(),
            ),
        ]);
        build_app_config(|key| vars.get(key).cloned().ok_or(VarError::NotPresent))
            .expect("test config")
    }

    pub(crate) async fn test_state(portal_base_url: &str, dashboard: bool) -> AppState {
        let config = test_config(portal_base_url, dashboard);
        let pool = newsdigest_db::connect_in_memory()
            .await
            .expect("in-memory pool");
        let pipeline = PipelineContext {
            pool,
            portal: Arc::new(PortalClient::from_app_config(&config).expect("portal client")),
            nlp: NlpBackends {
                summarizer: Arc::new(LeadSummarizer::new(3, 60)),
                classifier: Arc::new(LexiconClassifier),
            },
        };
        AppState::new(Arc::new(config), pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::test_state;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("not_found", StatusCode::NOT_FOUND),
            ("upstream_error", StatusCode::BAD_GATEWAY),
            ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[test]
    fn parse_section_rejects_unknown_values() {
        assert_eq!(parse_section("r", "economy").unwrap(), Section::Economy);
        let err = parse_section("r", "sports").unwrap_err();
        assert_eq!(err.error.code, "validation_error");
    }

    #[tokio::test]
    async fn health_is_public_and_echoes_request_id() {
        let state = test_state("http://127.0.0.1:9", false).await;
        let app = build_app(
            state,
            AuthState::from_keys(&["secret".to_string()], false).unwrap(),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-request-id").unwrap(),
            "req-health"
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["meta"]["request_id"], "req-health");
    }

    #[tokio::test]
    async fn health_reports_degraded_when_database_is_closed() {
        let state = test_state("http://127.0.0.1:9", false).await;
        state.pool.close().await;
        let app = build_app(state, AuthState::disabled(), default_rate_limit_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn protected_routes_require_bearer_token() {
        let state = test_state("http://127.0.0.1:9", false).await;
        let app = build_app(
            state,
            AuthState::from_keys(&["secret".to_string()], false).unwrap(),
            default_rate_limit_state(),
        );

        let denied = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/articles")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/articles")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(allowed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rate_limit_rejects_requests_over_the_window() {
        let state = test_state("http://127.0.0.1:9", false).await;
        let app = build_app(
            state,
            AuthState::disabled(),
            RateLimitState::new(1, Duration::from_secs(60)),
        );
        let request = || {
            Request::builder()
                .uri("/api/v1/statistics")
                .body(Body::empty())
                .expect("request")
        };

        let first = app.clone().oneshot(request()).await.expect("response");
        assert_eq!(first.status(), StatusCode::OK);
        let second = app.oneshot(request()).await.expect("response");
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn dashboard_is_not_mounted_when_disabled() {
        let state = test_state("http://127.0.0.1:9", false).await;
        let app = build_app(state, AuthState::disabled(), default_rate_limit_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
