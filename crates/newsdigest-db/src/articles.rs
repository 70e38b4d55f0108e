//! Database operations for the `articles` table.

use chrono::{DateTime, Utc};
use newsdigest_core::{Article, NewArticle, Section, SentimentLabel};
use sqlx::SqlitePool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub section: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub sentiment_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl ArticleRow {
    /// Convert the raw row into the typed domain article.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] if the stored section or sentiment
    /// label is not one the application knows.
    pub fn into_article(self) -> Result<Article, DbError> {
        let section = self
            .section
            .parse::<Section>()
            .map_err(|_| DbError::InvalidColumn {
                column: "section",
                value: self.section.clone(),
            })?;
        let sentiment = self
            .sentiment
            .as_deref()
            .map(str::parse::<SentimentLabel>)
            .transpose()
            .map_err(|_| DbError::InvalidColumn {
                column: "sentiment",
                value: self.sentiment.clone().unwrap_or_default(),
            })?;

        Ok(Article {
            id: self.id,
            section,
            title: self.title,
            url: self.url,
            content: self.content,
            summary: self.summary,
            sentiment,
            sentiment_score: self.sentiment_score,
            created_at: self.created_at,
        })
    }
}

/// Result of [`insert_article_if_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this id.
    Inserted(i64),
    /// A row with the same URL already existed; nothing was written.
    Existing(i64),
}

impl InsertOutcome {
    #[must_use]
    pub fn id(self) -> i64 {
        match self {
            InsertOutcome::Inserted(id) | InsertOutcome::Existing(id) => id,
        }
    }

    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

pub(crate) const ARTICLE_COLUMNS: &str =
    "id, section, title, url, content, summary, sentiment, sentiment_score, created_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert an article unless one with the same URL is already stored.
///
/// The existence check and the write are a single statement, so two
/// concurrent writers for the same URL cannot both insert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or the follow-up lookup fails.
pub async fn insert_article_if_new(
    pool: &SqlitePool,
    article: &NewArticle,
) -> Result<InsertOutcome, DbError> {
    let (label, score) = match article.sentiment {
        Some(s) => (Some(s.label.as_str()), Some(s.score)),
        None => (None, None),
    };

    let result = sqlx::query(
        "INSERT INTO articles \
             (section, title, url, content, summary, sentiment, sentiment_score, created_at) \
         SELECT ?, ?, ?, ?, ?, ?, ?, ? \
         WHERE NOT EXISTS (SELECT 1 FROM articles WHERE url = ?)",
    )
    .bind(article.section.slug())
    .bind(&article.title)
    .bind(&article.url)
    .bind(&article.content)
    .bind(article.summary.as_deref())
    .bind(label)
    .bind(score)
    .bind(Utc::now())
    .bind(&article.url)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(InsertOutcome::Inserted(result.last_insert_rowid()));
    }

    let existing: i64 =
        sqlx::query_scalar("SELECT id FROM articles WHERE url = ? ORDER BY id DESC LIMIT 1")
            .bind(&article.url)
            .fetch_one(pool)
            .await?;

    Ok(InsertOutcome::Existing(existing))
}

/// Return `true` if an article with this URL is already stored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn article_exists_by_url(pool: &SqlitePool, url: &str) -> Result<bool, DbError> {
    let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM articles WHERE url = ?)")
        .bind(url)
        .fetch_one(pool)
        .await?;
    Ok(exists != 0)
}

/// Fetch a single article by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this id, or [`DbError::Sqlx`]
/// on query failure.
pub async fn get_article(pool: &SqlitePool, id: i64) -> Result<ArticleRow, DbError> {
    sqlx::query_as::<_, ArticleRow>(&format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// List articles newest first, optionally restricted to one section.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles(
    pool: &SqlitePool,
    section: Option<Section>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ArticleRow>, DbError> {
    let rows = match section {
        Some(section) => {
            sqlx::query_as::<_, ArticleRow>(&format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles \
                 WHERE section = ? \
                 ORDER BY created_at DESC, id DESC \
                 LIMIT ? OFFSET ?"
            ))
            .bind(section.slug())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, ArticleRow>(&format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles \
                 ORDER BY created_at DESC, id DESC \
                 LIMIT ? OFFSET ?"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

/// Delete an article by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row was deleted, or [`DbError::Sqlx`]
/// on query failure.
pub async fn delete_article(pool: &SqlitePool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
