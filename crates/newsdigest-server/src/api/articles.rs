use axum::{extract::State, http::StatusCode, Extension, Json};
use newsdigest_core::{Article, NewArticle, Sentiment, SentimentLabel};
use newsdigest_db::InsertOutcome;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::{
    map_db_error, normalize_limit, parse_section, ApiError, ApiResponse, AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ArticleQuery {
    pub section: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SaveArticleRequest {
    pub section: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub summary: Option<String>,
    pub sentiment: Option<SentimentLabel>,
    pub sentiment_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct SaveArticleResponse {
    pub id: i64,
    pub created: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/articles, newest first, optionally filtered by section.
pub(super) async fn list_articles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiQuery(query): ApiQuery<ArticleQuery>,
) -> Result<Json<ApiResponse<Vec<Article>>>, ApiError> {
    let rid = &req_id.0;
    let section = query
        .section
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_section(rid, s))
        .transpose()?;

    let rows = newsdigest_db::list_articles(
        &state.pool,
        section,
        normalize_limit(query.limit),
        query.offset.unwrap_or(0).max(0),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(newsdigest_db::ArticleRow::into_article)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/articles/{id}
pub(super) async fn get_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Article>>, ApiError> {
    let rid = &req_id.0;
    let article = newsdigest_db::get_article(&state.pool, id)
        .await
        .and_then(newsdigest_db::ArticleRow::into_article)
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: article,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/articles/{id}
pub(super) async fn delete_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    newsdigest_db::delete_article(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(id, "article deleted");
    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true, "id": id }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/articles stores an article unless its URL is already known.
///
/// Returns 201 for a new row and 200 with the existing id for a duplicate.
pub(super) async fn save_article(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<SaveArticleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SaveArticleResponse>>), ApiError> {
    let rid = &req_id.0;
    let article = validate_new_article(rid, body)?;

    let outcome = newsdigest_db::insert_article_if_new(&state.pool, &article)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let status = match outcome {
        InsertOutcome::Inserted(_) => StatusCode::CREATED,
        InsertOutcome::Existing(_) => StatusCode::OK,
    };
    Ok((
        status,
        Json(ApiResponse {
            data: SaveArticleResponse {
                id: outcome.id(),
                created: outcome.is_new(),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

fn validate_new_article(rid: &str, body: SaveArticleRequest) -> Result<NewArticle, ApiError> {
    let section = parse_section(rid, &body.section)?;

    let title = body.title.trim().to_owned();
    let url = body.url.trim().to_owned();
    let content = body.content.trim().to_owned();
    if title.is_empty() || content.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "title and content must not be empty",
        ));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("url must be an absolute http(s) URL, got '{url}'"),
        ));
    }

    let sentiment = match (body.sentiment, body.sentiment_score) {
        (None, None) => None,
        (Some(label), Some(score)) if (0.0..=1.0).contains(&score) => {
            Some(Sentiment { label, score })
        }
        (Some(_), Some(score)) => {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("sentiment_score must be between 0 and 1, got {score}"),
            ))
        }
        _ => {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "sentiment and sentiment_score must be given together",
            ))
        }
    };

    Ok(NewArticle {
        section,
        title,
        url,
        content,
        summary: body.summary.filter(|s| !s.trim().is_empty()),
        sentiment,
    })
}
