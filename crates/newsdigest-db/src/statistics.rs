//! Aggregate read queries over the `articles` table.

use chrono::{NaiveDate, TimeDelta};
use newsdigest_core::{Section, SentimentLabel};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::DbError;

#[derive(Debug, Clone, Serialize)]
pub struct SectionCount {
    pub section: Section,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyCount {
    /// Calendar day (UTC) formatted as `YYYY-MM-DD`.
    pub day: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentCount {
    pub label: SentimentLabel,
    pub count: i64,
}

/// Dashboard statistics snapshot.
///
/// `section_counts` always lists all six sections, zero-filled, so its
/// counts sum to `total_articles`.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleStatistics {
    pub total_articles: i64,
    pub today_articles: i64,
    pub section_counts: Vec<SectionCount>,
    pub daily_counts: Vec<DailyCount>,
    pub sentiment_counts: Vec<SentimentCount>,
    pub average_sentiment_score: Option<f64>,
}

/// Compute article statistics.
///
/// `today` is the UTC calendar day to count as "today". `daily_counts` covers
/// the calendar window of `window_days` days ending at `today`, oldest first;
/// days without articles are omitted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any aggregate query fails.
pub async fn article_statistics(
    pool: &SqlitePool,
    today: NaiveDate,
    window_days: i64,
) -> Result<ArticleStatistics, DbError> {
    let total_articles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;

    let today_articles: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE date(created_at) = ?")
            .bind(today.format("%Y-%m-%d").to_string())
            .fetch_one(pool)
            .await?;

    let by_section: Vec<(String, i64)> =
        sqlx::query_as("SELECT section, COUNT(*) FROM articles GROUP BY section")
            .fetch_all(pool)
            .await?;
    let section_counts = Section::ALL
        .into_iter()
        .map(|section| SectionCount {
            section,
            count: by_section
                .iter()
                .find(|(slug, _)| slug == section.slug())
                .map_or(0, |(_, count)| *count),
        })
        .collect();

    let window_start = TimeDelta::try_days(window_days.max(1) - 1)
        .and_then(|span| today.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN);
    let daily_counts = sqlx::query_as::<_, DailyCount>(
        "SELECT date(created_at) AS day, COUNT(*) AS count \
         FROM articles \
         WHERE date(created_at) BETWEEN ? AND ? \
         GROUP BY day \
         ORDER BY day",
    )
    .bind(window_start.format("%Y-%m-%d").to_string())
    .bind(today.format("%Y-%m-%d").to_string())
    .fetch_all(pool)
    .await?;

    let by_label: Vec<(String, i64)> = sqlx::query_as(
        "SELECT sentiment, COUNT(*) FROM articles \
         WHERE sentiment IS NOT NULL \
         GROUP BY sentiment",
    )
    .fetch_all(pool)
    .await?;
    let sentiment_counts = SentimentLabel::ALL
        .into_iter()
        .map(|label| SentimentCount {
            label,
            count: by_label
                .iter()
                .find(|(raw, _)| raw == label.as_str())
                .map_or(0, |(_, count)| *count),
        })
        .collect();

    let average_sentiment_score: Option<f64> = sqlx::query_scalar(
        "SELECT AVG(sentiment_score) FROM articles WHERE sentiment_score IS NOT NULL",
    )
    .fetch_one(pool)
    .await?;

    Ok(ArticleStatistics {
        total_articles,
        today_articles,
        section_counts,
        daily_counts,
        sentiment_counts,
        average_sentiment_score,
    })
}
