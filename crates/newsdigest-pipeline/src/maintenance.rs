//! Periodic maintenance sweep over stored articles.

use newsdigest_db::{
    count_integrity_issues, list_articles_missing_sentiment, list_articles_missing_summary,
    remove_duplicate_urls, update_article_sentiment, update_article_summary, DbError,
    IntegrityCounts,
};
use newsdigest_nlp::NlpBackends;
use serde::Serialize;
use sqlx::SqlitePool;

/// Rows fetched per backfill page.
const BACKFILL_PAGE: i64 = 500;

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceReport {
    pub duplicates_removed: u64,
    pub summaries_backfilled: usize,
    pub sentiments_backfilled: usize,
    pub backfill_failures: usize,
    pub integrity: IntegrityCounts,
}

/// Run one maintenance sweep.
///
/// 1. Remove duplicate URLs, keeping the newest row for each.
/// 2. Backfill missing summaries from article content.
/// 3. Re-classify rows with no sentiment or a null/zero score, from the
///    summary when there is one and from the content otherwise.
/// 4. Count integrity problems. Nothing is modified in this step.
///
/// Backfill pages through every incomplete row by id, so rows whose model
/// call keeps failing do not starve newer ones. Failures are logged and
/// counted; the row stays as it is and is retried on the next sweep.
///
/// # Errors
///
/// Returns [`DbError`] if any database step fails.
pub async fn run_maintenance(
    pool: &SqlitePool,
    nlp: &NlpBackends,
) -> Result<MaintenanceReport, DbError> {
    let mut report = MaintenanceReport {
        duplicates_removed: remove_duplicate_urls(pool).await?,
        ..MaintenanceReport::default()
    };
    if report.duplicates_removed > 0 {
        tracing::info!(removed = report.duplicates_removed, "removed duplicate articles");
    }

    let mut after_id = 0;
    loop {
        let page = list_articles_missing_summary(pool, after_id, BACKFILL_PAGE).await?;
        let Some(last) = page.last() else { break };
        after_id = last.id;
        for row in page {
            match nlp.summarizer.summarize(&row.content).await {
                Ok(summary) => {
                    update_article_summary(pool, row.id, &summary).await?;
                    report.summaries_backfilled += 1;
                }
                Err(e) => {
                    tracing::warn!(id = row.id, error = %e, "summary backfill failed");
                    report.backfill_failures += 1;
                }
            }
        }
    }

    let mut after_id = 0;
    loop {
        let page = list_articles_missing_sentiment(pool, after_id, BACKFILL_PAGE).await?;
        let Some(last) = page.last() else { break };
        after_id = last.id;
        for row in page {
            let text = row
                .summary
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(&row.content);
            match nlp.classifier.classify(text).await {
                Ok(sentiment) => {
                    update_article_sentiment(pool, row.id, sentiment).await?;
                    report.sentiments_backfilled += 1;
                }
                Err(e) => {
                    tracing::warn!(id = row.id, error = %e, "sentiment backfill failed");
                    report.backfill_failures += 1;
                }
            }
        }
    }

    report.integrity = count_integrity_issues(pool).await?;
    if report.integrity.total() > 0 {
        tracing::warn!(
            empty_title = report.integrity.empty_title,
            empty_content = report.integrity.empty_content,
            empty_url = report.integrity.empty_url,
            invalid_url = report.integrity.invalid_url,
            "integrity check found problem rows"
        );
    }

    tracing::info!(
        duplicates_removed = report.duplicates_removed,
        summaries_backfilled = report.summaries_backfilled,
        sentiments_backfilled = report.sentiments_backfilled,
        backfill_failures = report.backfill_failures,
        "maintenance sweep complete"
    );
    Ok(report)
}
