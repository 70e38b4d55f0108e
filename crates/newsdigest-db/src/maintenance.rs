//! Housekeeping queries used by the periodic maintenance sweep.

use newsdigest_core::Sentiment;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::articles::{ArticleRow, ARTICLE_COLUMNS};
use crate::DbError;

/// Row counts that fail integrity checks. Nothing is modified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityCounts {
    pub empty_title: i64,
    pub empty_content: i64,
    pub empty_url: i64,
    /// Rows whose url does not start with `http`.
    pub invalid_url: i64,
}

impl IntegrityCounts {
    #[must_use]
    pub fn total(&self) -> i64 {
        self.empty_title + self.empty_content + self.empty_url + self.invalid_url
    }
}

/// Delete all but the newest row for every URL.
///
/// "Newest" is the latest `created_at`; ties keep the highest id.
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn remove_duplicate_urls(pool: &SqlitePool) -> Result<u64, DbError> {
    let result = sqlx::query(
        "DELETE FROM articles WHERE id IN ( \
             SELECT id FROM ( \
                 SELECT id, ROW_NUMBER() OVER ( \
                     PARTITION BY url ORDER BY created_at DESC, id DESC \
                 ) AS rn \
                 FROM articles \
             ) WHERE rn > 1 \
         )",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Rows with no summary and an id above `after_id`, in id order.
///
/// Callers page through the table by passing the last id they saw, so rows
/// that keep failing never hide the ones behind them.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles_missing_summary(
    pool: &SqlitePool,
    after_id: i64,
    limit: i64,
) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles \
         WHERE id > ? AND (summary IS NULL OR TRIM(summary) = '') \
         ORDER BY id \
         LIMIT ?"
    ))
    .bind(after_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Rows with no sentiment label, or a null or zero score, and an id above
/// `after_id`, in id order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles_missing_sentiment(
    pool: &SqlitePool,
    after_id: i64,
    limit: i64,
) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles \
         WHERE id > ? \
           AND (sentiment IS NULL OR sentiment_score IS NULL OR sentiment_score = 0) \
         ORDER BY id \
         LIMIT ?"
    ))
    .bind(after_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the row does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_article_summary(
    pool: &SqlitePool,
    id: i64,
    summary: &str,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE articles SET summary = ? WHERE id = ?")
        .bind(summary)
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the row does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_article_sentiment(
    pool: &SqlitePool,
    id: i64,
    sentiment: Sentiment,
) -> Result<(), DbError> {
    let result =
        sqlx::query("UPDATE articles SET sentiment = ?, sentiment_score = ? WHERE id = ?")
            .bind(sentiment.label.as_str())
            .bind(sentiment.score)
            .bind(id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Count rows with empty required fields or a non-http url.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_integrity_issues(pool: &SqlitePool) -> Result<IntegrityCounts, DbError> {
    let (empty_title, empty_content, empty_url, invalid_url): (i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT \
                 COALESCE(SUM(CASE WHEN TRIM(title) = '' THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN TRIM(content) = '' THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN TRIM(url) = '' THEN 1 ELSE 0 END), 0), \
                 COALESCE(SUM(CASE WHEN url NOT LIKE 'http%' THEN 1 ELSE 0 END), 0) \
             FROM articles",
        )
        .fetch_one(pool)
        .await?;

    Ok(IntegrityCounts {
        empty_title,
        empty_content,
        empty_url,
        invalid_url,
    })
}
