//! IMSDB screenplay scraper.
//!
//! IMSDB hosts screenplay text inside a `<td class="scrtext">` cell. There is
//! no search API, so lookups try a small set of URL shapes the site uses.

pub mod client;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Network(String),
    #[error("script not found")]
    NotFound,
}

/// A screenplay fetched from the source site.
#[derive(Debug, Clone)]
pub struct FetchedScript {
    pub text: String,
    pub source_url: String,
}

/// A source of movie screenplays.
#[async_trait::async_trait]
pub trait ScriptSource: Send + Sync {
    /// Check whether a screenplay exists for the given title.
    async fn check(&self, movie: &str) -> Result<bool, ScrapeError>;

    /// Fetch the screenplay text for the given title.
    async fn fetch_script(&self, movie: &str) -> Result<FetchedScript, ScrapeError>;
}
