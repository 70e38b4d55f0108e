//! News portal fetcher.
//!
//! Pulls the article links listed on a section page, then downloads and
//! extracts each article's title and body text.

pub mod client;
pub mod error;
pub mod parse;

pub use client::{FetchedArticle, PortalClient};
pub use error::ScraperError;
pub use parse::PortalSelectors;
