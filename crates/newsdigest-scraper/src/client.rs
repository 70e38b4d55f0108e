//! HTTP client for the news portal's section listings and article pages.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use newsdigest_core::{AppConfig, Section};
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::ScraperError;
use crate::parse::{extract_article, extract_section_links, PortalSelectors};

/// An article page that was downloaded and parsed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArticle {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// Client for the news portal.
///
/// Listing failures surface as typed errors. Individual article failures
/// are logged and skipped so one broken page never sinks a whole section.
#[derive(Debug)]
pub struct PortalClient {
    client: Client,
    base_url: Url,
    selectors: PortalSelectors,
}

impl PortalClient {
    /// Creates a `PortalClient` with a fixed per-request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` does not parse,
    /// [`ScraperError::Http`] if the `reqwest::Client` cannot be built, or
    /// [`ScraperError::Selector`] if the extraction selectors fail to compile.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        let base_url = Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            selectors: PortalSelectors::new()?,
        })
    }

    /// # Errors
    ///
    /// See [`PortalClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.portal_base_url,
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the section listing and return up to `limit` unique article URLs.
    ///
    /// # Errors
    ///
    /// Returns a [`ScraperError`] if the listing page cannot be retrieved.
    #[instrument(skip(self), fields(section = %section))]
    pub async fn fetch_section_links(
        &self,
        section: Section,
        limit: usize,
    ) -> Result<Vec<String>, ScraperError> {
        let listing_url = self
            .base_url
            .join(&section.listing_path())
            .map_err(|e| ScraperError::InvalidUrl {
                url: section.listing_path(),
                reason: e.to_string(),
            })?;

        let html = self.get_html(listing_url.as_str()).await?;
        let links = extract_section_links(&self.selectors, &html, &self.base_url, limit);
        debug!(count = links.len(), "extracted section links");
        Ok(links)
    }

    /// Download and parse a single article page.
    ///
    /// Returns `None` on any failure (network, non-2xx status, missing title
    /// or body). Failures are logged at `warn`.
    #[instrument(skip(self))]
    pub async fn fetch_article(&self, url: &str) -> Option<FetchedArticle> {
        let html = match self.get_html(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "failed to fetch article");
                return None;
            }
        };

        if let Some(parsed) = extract_article(&self.selectors, &html) {
            Some(FetchedArticle {
                url: url.to_owned(),
                title: parsed.title,
                content: parsed.content,
            })
        } else {
            warn!("article page is missing a title or body");
            None
        }
    }

    /// Fetch up to `limit` articles for a section.
    ///
    /// Article pages are downloaded concurrently, at most `concurrency` at a
    /// time, and returned in listing order. Pages that fail are dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`ScraperError`] if the listing page cannot be retrieved.
    pub async fn fetch_section(
        &self,
        section: Section,
        limit: usize,
        concurrency: usize,
    ) -> Result<Vec<FetchedArticle>, ScraperError> {
        let links = self.fetch_section_links(section, limit).await?;

        let articles: Vec<FetchedArticle> = stream::iter(links)
            .map(|url| async move { self.fetch_article(&url).await })
            .buffered(concurrency.max(1))
            .filter_map(|article| async move { article })
            .collect()
            .await;

        Ok(articles)
    }

    async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9,en;q=0.8")
            .header(reqwest::header::REFERER, self.base_url.as_str())
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ScraperError::RateLimited {
                url: url.to_owned(),
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }
}
