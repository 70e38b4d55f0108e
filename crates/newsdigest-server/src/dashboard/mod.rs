//! Server-rendered HTML dashboard.
//!
//! Every handler answers with a page. Failures are shown as a message in
//! the page body instead of an HTTP error status.

mod render;

use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        Path, Query, State,
    },
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;
use newsdigest_core::{Article, Section};
use serde::Deserialize;

use crate::api::{AppState, STATISTICS_DAYS};

const LIST_LIMIT: i64 = 100;
const DEFAULT_SEARCH_COUNT: usize = 10;
const MAX_SEARCH_COUNT: usize = 200;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(overview))
        .route("/dashboard/articles", get(articles))
        .route("/dashboard/articles/{id}", get(article_detail))
        .route("/dashboard/articles/{id}/delete", post(delete_article))
        .route("/dashboard/statistics", get(statistics))
        .route("/dashboard/search", get(search_form).post(search))
}

#[derive(Debug, Deserialize)]
struct SectionFilter {
    section: Option<String>,
    deleted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchForm {
    section: Option<String>,
    count: Option<String>,
}

/// Blank and unknown values mean "no filter"; the bool reports whether the
/// value was unknown.
fn parse_filter(raw: Option<&str>) -> (Option<Section>, bool) {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => (None, false),
        Some(s) => match s.parse::<Section>() {
            Ok(section) => (Some(section), false),
            Err(_) => (None, true),
        },
    }
}

async fn load_articles(
    state: &AppState,
    section: Option<Section>,
    limit: i64,
) -> Result<Vec<Article>, newsdigest_db::DbError> {
    newsdigest_db::list_articles(&state.pool, section, limit, 0)
        .await?
        .into_iter()
        .map(newsdigest_db::ArticleRow::into_article)
        .collect()
}

async fn overview(State(state): State<AppState>) -> Html<String> {
    let stats =
        newsdigest_db::article_statistics(&state.pool, Utc::now().date_naive(), STATISTICS_DAYS)
            .await;
    let recent = load_articles(&state, None, 10).await;

    let body = match (stats, recent) {
        (Ok(stats), Ok(recent)) => format!(
            "{}<h2>Latest articles</h2>{}",
            render::metrics(&stats),
            render::article_table(&recent)
        ),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "dashboard: overview query failed");
            render::error_message("Could not load the overview. Check the server logs.")
        }
    };
    render::page("News Digest", &body)
}

async fn articles(
    State(state): State<AppState>,
    Query(filter): Query<SectionFilter>,
) -> Html<String> {
    let (section, unknown) = parse_filter(filter.section.as_deref());
    let mut messages = String::new();
    if unknown {
        messages.push_str(&render::error_message(
            "Unknown section; showing all sections.",
        ));
    }
    if let Some(id) = filter.deleted.as_deref().and_then(|v| v.parse::<i64>().ok()) {
        messages.push_str(&render::notice(&format!("Article {id} deleted.")));
    }
    articles_page(&state, section, &messages).await
}

/// The article list, with `messages` (already rendered HTML) above the table.
async fn articles_page(
    state: &AppState,
    section: Option<Section>,
    messages: &str,
) -> Html<String> {
    let mut body = format!(
        "<form method=\"get\" action=\"/dashboard/articles\">{} \
         <button type=\"submit\">Filter</button></form>{messages}",
        render::section_select(section, true)
    );
    match load_articles(state, section, LIST_LIMIT).await {
        Ok(list) => body.push_str(&render::article_table(&list)),
        Err(e) => {
            tracing::error!(error = %e, "dashboard: article list query failed");
            body.push_str(&render::error_message("Could not load articles."));
        }
    }
    render::page("Articles", &body)
}

async fn article_detail(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Html<String> {
    let Ok(Path(id)) = id else {
        return render::page(
            "Article not found",
            &render::error_message("Article ids are whole numbers."),
        );
    };
    let article = newsdigest_db::get_article(&state.pool, id)
        .await
        .and_then(newsdigest_db::ArticleRow::into_article);
    match article {
        Ok(article) => render::page(&article.title, &render::article_detail(&article)),
        Err(newsdigest_db::DbError::NotFound) => render::page(
            "Article not found",
            &render::error_message(&format!("No article with id {id}.")),
        ),
        Err(e) => {
            tracing::error!(id, error = %e, "dashboard: article query failed");
            render::page("Article", &render::error_message("Could not load the article."))
        }
    }
}

/// Redirects back to the list on success; a failed delete renders the list
/// with the reason.
async fn delete_article(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = id else {
        let message = render::error_message("Article ids are whole numbers.");
        return articles_page(&state, None, &message).await.into_response();
    };
    let message = match newsdigest_db::delete_article(&state.pool, id).await {
        Ok(()) => {
            tracing::info!(id, "dashboard: article deleted");
            return Redirect::to(&format!("/dashboard/articles?deleted={id}")).into_response();
        }
        Err(newsdigest_db::DbError::NotFound) => {
            tracing::warn!(id, "dashboard: delete of missing article");
            format!("Article {id} was not found; nothing was deleted.")
        }
        Err(e) => {
            tracing::error!(id, error = %e, "dashboard: delete failed");
            format!("Could not delete article {id}.")
        }
    };
    articles_page(&state, None, &render::error_message(&message))
        .await
        .into_response()
}

async fn statistics(State(state): State<AppState>) -> Html<String> {
    let stats =
        newsdigest_db::article_statistics(&state.pool, Utc::now().date_naive(), STATISTICS_DAYS)
            .await;
    let body = match stats {
        Ok(stats) => format!(
            "{}{}",
            render::metrics(&stats),
            render::statistics_tables(&stats)
        ),
        Err(e) => {
            tracing::error!(error = %e, "dashboard: statistics query failed");
            render::error_message("Could not load statistics.")
        }
    };
    render::page("Statistics", &body)
}

async fn search_form() -> Html<String> {
    render::page("Search", &render::search_form(None, DEFAULT_SEARCH_COUNT))
}

async fn search(
    State(state): State<AppState>,
    form: Result<Form<SearchForm>, FormRejection>,
) -> Html<String> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "dashboard: unreadable search form");
            return search_page(
                None,
                DEFAULT_SEARCH_COUNT,
                &render::error_message(
                    "The search form could not be read; please submit it again.",
                ),
            );
        }
    };
    let count = form
        .count
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or(Ok(DEFAULT_SEARCH_COUNT), str::parse::<usize>);
    let section = form
        .section
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<Section>().ok());

    let (section, count) = match (section, count) {
        (Some(section), Ok(count)) if (1..=MAX_SEARCH_COUNT).contains(&count) => (section, count),
        (None, _) => {
            return search_page(
                None,
                DEFAULT_SEARCH_COUNT,
                &render::error_message("Choose one of the listed sections."),
            );
        }
        (Some(section), _) => {
            return search_page(
                Some(section),
                DEFAULT_SEARCH_COUNT,
                &render::error_message(&format!(
                    "Count must be a number between 1 and {MAX_SEARCH_COUNT}."
                )),
            );
        }
    };

    let result = match newsdigest_pipeline::ingest_section(&state.pipeline, section, count).await {
        Ok(report) => render::ingest_result(&report),
        Err(e) => {
            tracing::warn!(section = %section, error = %e, "dashboard: ingestion failed");
            render::error_message(&format!("Ingestion failed: {e}"))
        }
    };
    search_page(Some(section), count, &result)
}

fn search_page(section: Option<Section>, count: usize, result: &str) -> Html<String> {
    render::page(
        "Search",
        &format!("{}{result}", render::search_form(section, count)),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use newsdigest_core::{NewArticle, Section};
    use tower::ServiceExt;

    use super::parse_filter;
    use crate::api::test_support::test_state;
    use crate::api::{build_app, default_rate_limit_state, AppState};
    use crate::middleware::AuthState;

    async fn seeded_state(portal: &str) -> (AppState, i64) {
        let state = test_state(portal, true).await;
        let id = newsdigest_db::insert_article_if_new(
            &state.pool,
            &NewArticle {
                section: Section::Politics,
                title: "<b>국회</b> 본회의".to_string(),
                url: "https://news.example.com/p/1".to_string(),
                content: "국회가 본회의를 열었다.".to_string(),
                summary: Some("본회의 개최".to_string()),
                sentiment: None,
            },
        )
        .await
        .expect("insert")
        .id();
        (state, id)
    }

    fn app(state: AppState) -> Router {
        build_app(state, AuthState::disabled(), default_rate_limit_state())
    }

    async fn html(response: axum::response::Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        String::from_utf8(body.to_vec()).expect("utf-8 body")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[test]
    fn parse_filter_treats_blank_as_all() {
        assert_eq!(parse_filter(None), (None, false));
        assert_eq!(parse_filter(Some("  ")), (None, false));
        assert_eq!(parse_filter(Some("world")), (Some(Section::World), false));
        assert_eq!(parse_filter(Some("weather")), (None, true));
    }

    #[tokio::test]
    async fn article_list_escapes_titles() {
        let (state, _) = seeded_state("http://127.0.0.1:9").await;
        let response = app(state)
            .oneshot(get("/dashboard/articles?section=politics"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let page = html(response).await;
        assert!(page.contains("&lt;b&gt;국회&lt;/b&gt; 본회의"));
        assert!(!page.contains("<b>국회</b>"));
        assert!(page.contains("<option value=\"politics\" selected>"));
    }

    #[tokio::test]
    async fn missing_article_renders_message_not_error_status() {
        let (state, _) = seeded_state("http://127.0.0.1:9").await;
        let response = app(state)
            .oneshot(get("/dashboard/articles/9999"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(html(response).await.contains("No article with id 9999."));
    }

    #[tokio::test]
    async fn delete_form_removes_article_and_redirects() {
        let (state, id) = seeded_state("http://127.0.0.1:9").await;
        let pool = state.pool.clone();
        let response = app(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/dashboard/articles/{id}/delete"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers().get(header::LOCATION).unwrap();
        assert_eq!(location, format!("/dashboard/articles?deleted={id}").as_str());
        assert!(matches!(
            newsdigest_db::get_article(&pool, id).await,
            Err(newsdigest_db::DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_confirms_a_delete() {
        let (state, _) = seeded_state("http://127.0.0.1:9").await;
        let page = html(
            app(state)
                .oneshot(get("/dashboard/articles?deleted=42"))
                .await
                .expect("response"),
        )
        .await;
        assert!(page.contains("Article 42 deleted."));
    }

    #[tokio::test]
    async fn deleting_a_missing_article_shows_a_message() {
        let (state, _) = seeded_state("http://127.0.0.1:9").await;
        let app = app(state);
        let post = |uri: &str| {
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .expect("request")
        };

        let response = app
            .clone()
            .oneshot(post("/dashboard/articles/9999/delete"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let page = html(response).await;
        assert!(page.contains("Article 9999 was not found; nothing was deleted."));
        assert!(page.contains("class=\"error\""));

        let response = app
            .oneshot(post("/dashboard/articles/abc/delete"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(html(response).await.contains("Article ids are whole numbers."));
    }

    #[tokio::test]
    async fn statistics_page_lists_every_section() {
        let (state, _) = seeded_state("http://127.0.0.1:9").await;
        let page = html(
            app(state)
                .oneshot(get("/dashboard/statistics"))
                .await
                .expect("response"),
        )
        .await;
        for section in Section::ALL {
            let cell = format!("<td>{}</td>", super::render::escape(section.label()));
            assert!(page.contains(&cell));
        }
    }

    #[tokio::test]
    async fn search_reports_upstream_failure_in_page() {
        let server = wiremock::MockServer::start().await;
        let state = test_state(&server.uri(), true).await;
        let response = app(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/dashboard/search")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("section=economy&count=3"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let page = html(response).await;
        assert!(page.contains("Ingestion failed"));
        assert!(page.contains("<option value=\"economy\" selected>"));
    }

    #[tokio::test]
    async fn search_without_section_renders_message() {
        let state = test_state("http://127.0.0.1:9", true).await;
        let app = app(state);
        for (content_type, body) in [
            ("application/x-www-form-urlencoded", "count=5"),
            ("text/plain", "section=world"),
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/dashboard/search")
                        .header(header::CONTENT_TYPE, content_type)
                        .body(Body::from(body))
                        .expect("request"),
                )
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK, "{content_type}");
            assert!(html(response).await.contains("class=\"error\""), "{content_type}");
        }
    }

    #[tokio::test]
    async fn search_rejects_bad_count() {
        let state = test_state("http://127.0.0.1:9", true).await;
        let response = app(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/dashboard/search")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("section=world&count=900"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert!(html(response).await.contains("Count must be a number"));
    }
}
