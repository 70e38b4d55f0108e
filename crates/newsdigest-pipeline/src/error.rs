use newsdigest_core::Section;
use newsdigest_db::DbError;
use newsdigest_scraper::ScraperError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("section listing failed: {0}")]
    Scraper(#[from] ScraperError),

    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("no articles could be fetched for section {section}")]
    NothingFetched { section: Section },
}
