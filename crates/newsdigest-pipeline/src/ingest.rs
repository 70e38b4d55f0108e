//! Section ingestion: fetch, dedup check, summarize, classify, persist.

use futures::future::join_all;
use newsdigest_core::{NewArticle, Section, SentimentLabel};
use newsdigest_db::{article_exists_by_url, insert_article_if_new, InsertOutcome};
use newsdigest_nlp::NlpBackends;
use newsdigest_scraper::FetchedArticle;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::IngestError;
use crate::retry::{retry_fixed, RetryPolicy};
use crate::PipelineContext;

/// An article written by this run.
#[derive(Debug, Clone, Serialize)]
pub struct StoredArticle {
    pub id: i64,
    pub section: Section,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub sentiment: Option<SentimentLabel>,
    pub sentiment_score: Option<f64>,
}

/// What happened during one section ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub section: Section,
    pub requested: usize,
    /// Article pages that downloaded and parsed.
    pub fetched: usize,
    /// Newly written articles only.
    pub stored: Vec<StoredArticle>,
    /// Articles whose URL was already stored.
    pub duplicates: usize,
    /// Articles dropped because summarization failed.
    pub skipped: usize,
}

/// Outcome of one section inside an all-sections run.
#[derive(Debug, Clone, Serialize)]
pub struct SectionOutcome {
    pub section: Section,
    pub report: Option<IngestReport>,
    pub error: Option<String>,
}

/// Aggregate of an all-sections run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<SectionOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub stored: usize,
}

impl RunSummary {
    /// Share of sections that succeeded, in percent.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let total = self.succeeded + self.failed;
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.succeeded as f64 / total as f64 * 100.0;
        rate
    }
}

/// Run the pipeline for one section.
///
/// 1. Fetch up to `count` articles from the section listing.
/// 2. Fail with [`IngestError::NothingFetched`] if none could be fetched.
/// 3. Hand the articles to [`ingest_fetched`].
///
/// # Errors
///
/// Returns [`IngestError`] if the listing fails, nothing is fetched, or the
/// database is unavailable.
pub async fn ingest_section(
    ctx: &PipelineContext,
    section: Section,
    count: usize,
) -> Result<IngestReport, IngestError> {
    let fetched = ctx.portal.fetch_section(section, count, count).await?;
    if fetched.is_empty() {
        tracing::warn!(section = %section, "no articles fetched");
        return Err(IngestError::NothingFetched { section });
    }
    ingest_fetched(&ctx.pool, &ctx.nlp, section, count, fetched).await
}

/// Process already-fetched articles in order.
///
/// For each article:
/// 1. Skip it if its URL is already stored (counted as a duplicate).
/// 2. Summarize the content. A failure skips the article.
/// 3. Classify the summary. A failure stores the article without sentiment.
/// 4. Insert it. Losing an insert race to another writer counts as a duplicate.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if a lookup or insert fails.
pub async fn ingest_fetched(
    pool: &SqlitePool,
    nlp: &NlpBackends,
    section: Section,
    requested: usize,
    articles: Vec<FetchedArticle>,
) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport {
        section,
        requested,
        fetched: articles.len(),
        stored: Vec::new(),
        duplicates: 0,
        skipped: 0,
    };

    for article in articles {
        if article_exists_by_url(pool, &article.url).await? {
            tracing::debug!(url = %article.url, "article already stored");
            report.duplicates += 1;
            continue;
        }

        let summary = match nlp.summarizer.summarize(&article.content).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(
                    url = %article.url,
                    error = %e,
                    "summarization failed; skipping article"
                );
                report.skipped += 1;
                continue;
            }
        };

        let sentiment = match nlp.classifier.classify(&summary).await {
            Ok(sentiment) => Some(sentiment),
            Err(e) => {
                tracing::warn!(
                    url = %article.url,
                    error = %e,
                    "classification failed; storing without sentiment"
                );
                None
            }
        };

        let new_article = NewArticle {
            section,
            title: article.title,
            url: article.url,
            content: article.content,
            summary: Some(summary),
            sentiment,
        };

        match insert_article_if_new(pool, &new_article).await? {
            InsertOutcome::Inserted(id) => report.stored.push(StoredArticle {
                id,
                section,
                title: new_article.title,
                url: new_article.url,
                summary: new_article.summary.unwrap_or_default(),
                sentiment: sentiment.map(|s| s.label),
                sentiment_score: sentiment.map(|s| s.score),
            }),
            InsertOutcome::Existing(_) => report.duplicates += 1,
        }
    }

    tracing::info!(
        section = %section,
        fetched = report.fetched,
        stored = report.stored.len(),
        duplicates = report.duplicates,
        skipped = report.skipped,
        "section ingested"
    );
    Ok(report)
}

/// Ingest every section concurrently, retrying each under `policy`.
///
/// Never fails as a whole; per-section errors are recorded in the summary.
pub async fn ingest_all_sections(
    ctx: &PipelineContext,
    count: usize,
    policy: RetryPolicy,
) -> RunSummary {
    let runs = Section::ALL.into_iter().map(|section| async move {
        let result =
            retry_fixed(policy, section.slug(), || ingest_section(ctx, section, count)).await;
        match result {
            Ok(report) => SectionOutcome {
                section,
                report: Some(report),
                error: None,
            },
            Err(e) => SectionOutcome {
                section,
                report: None,
                error: Some(e.to_string()),
            },
        }
    });
    let outcomes = join_all(runs).await;

    let succeeded = outcomes.iter().filter(|o| o.report.is_some()).count();
    let stored = outcomes
        .iter()
        .filter_map(|o| o.report.as_ref())
        .map(|r| r.stored.len())
        .sum();
    let summary = RunSummary {
        failed: outcomes.len() - succeeded,
        succeeded,
        stored,
        outcomes,
    };

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        stored = summary.stored,
        success_rate_pct = summary.success_rate(),
        "ingestion run complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_is_a_percentage() {
        let summary = RunSummary {
            outcomes: Vec::new(),
            succeeded: 3,
            failed: 1,
            stored: 0,
        };
        assert!((summary.success_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn success_rate_of_empty_run_is_zero() {
        let summary = RunSummary {
            outcomes: Vec::new(),
            succeeded: 0,
            failed: 0,
            stored: 0,
        };
        assert!(summary.success_rate().abs() < f64::EPSILON);
    }
}
