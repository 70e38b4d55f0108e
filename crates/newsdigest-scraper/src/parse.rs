//! HTML extraction for portal section listings and article pages.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScraperError;

const LINK_SELECTOR: &str = "div.sa_text a[href]";
const TITLE_SELECTORS: [&str; 2] = ["h2#title_area", "h2.media_end_headline"];
const CONTENT_SELECTORS: [&str; 3] = [
    "div#dic_area",
    "div#newsct_article",
    "div.article_body_contents",
];

/// Pre-compiled CSS selectors for the portal's markup.
#[derive(Debug)]
pub struct PortalSelectors {
    link: Selector,
    titles: Vec<Selector>,
    contents: Vec<Selector>,
}

impl PortalSelectors {
    /// # Errors
    ///
    /// Returns [`ScraperError::Selector`] if a selector fails to compile.
    pub fn new() -> Result<Self, ScraperError> {
        Ok(Self {
            link: compile(LINK_SELECTOR)?,
            titles: TITLE_SELECTORS
                .into_iter()
                .map(compile)
                .collect::<Result<_, _>>()?,
            contents: CONTENT_SELECTORS
                .into_iter()
                .map(compile)
                .collect::<Result<_, _>>()?,
        })
    }
}

fn compile(css: &'static str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::Selector {
        selector: css,
        reason: e.to_string(),
    })
}

/// Title and body text pulled from an article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArticle {
    pub title: String,
    pub content: String,
}

/// Extract up to `limit` unique article URLs from a section listing page,
/// in page order.
///
/// Comment-page links are rewritten to the article itself and cluster
/// (topic aggregation) links are dropped.
#[must_use]
pub fn extract_section_links(
    selectors: &PortalSelectors,
    html: &str,
    base: &Url,
    limit: usize,
) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links: Vec<String> = Vec::new();

    for anchor in document.select(&selectors.link) {
        if links.len() >= limit {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(url) = normalize_article_href(href, base) else {
            continue;
        };
        if !links.contains(&url) {
            links.push(url);
        }
    }

    links
}

/// Normalize a listing href into an absolute article URL.
///
/// Returns `None` for cluster links and hrefs that cannot be resolved.
#[must_use]
pub fn normalize_article_href(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.contains("/cluster/") {
        return None;
    }
    let rewritten = href.replace("/comment/", "/");
    base.join(&rewritten).ok().map(String::from)
}

/// Extract the headline and body from an article page.
///
/// Returns `None` when either is missing or empty after whitespace
/// normalization.
#[must_use]
pub fn extract_article(selectors: &PortalSelectors, html: &str) -> Option<ParsedArticle> {
    let document = Html::parse_document(html);
    let title = first_text(&document, &selectors.titles)?;
    let content = first_text(&document, &selectors.contents)?;
    Some(ParsedArticle { title, content })
}

fn first_text(document: &Html, candidates: &[Selector]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|selector| document.select(selector).next())
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Collapse all runs of whitespace into single spaces and trim the ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
