use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::{FetchedScript, ScrapeError, ScriptSource};

const BASE_URL: &str = "https://imsdb.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct ImsdbClient {
    base_url: String,
    client: reqwest::Client,
}

impl ImsdbClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    /// Point the client at a different host. Used by tests.
    pub fn with_base_url(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { base_url, client }
    }

    /// Try each candidate URL in order; return the first page that carries a
    /// script cell. Network errors on one candidate fall through to the next.
    async fn fetch_first_match(&self, movie: &str) -> Result<Option<FetchedScript>, ScrapeError> {
        for path in candidate_paths(movie) {
            let url = format!("{}{}", self.base_url, path);
            debug!(url = %url, "IMSDB request");

            let resp = match self.client.get(&url).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(url = %url, error = %e, "IMSDB request failed, trying next candidate");
                    continue;
                }
            };

            if !resp.status().is_success() {
                continue;
            }

            let html = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(url = %url, error = %e, "IMSDB body read failed");
                    continue;
                }
            };

            if let Some(text) = extract_script(&html) {
                return Ok(Some(FetchedScript {
                    text,
                    source_url: url,
                }));
            }
        }

        Ok(None)
    }
}

impl Default for ImsdbClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ScriptSource for ImsdbClient {
    async fn check(&self, movie: &str) -> Result<bool, ScrapeError> {
        Ok(self.fetch_first_match(movie).await?.is_some())
    }

    async fn fetch_script(&self, movie: &str) -> Result<FetchedScript, ScrapeError> {
        self.fetch_first_match(movie)
            .await?
            .ok_or(ScrapeError::NotFound)
    }
}

/// URL shapes IMSDB uses for script pages, in the order worth trying.
pub fn candidate_paths(movie: &str) -> Vec<String> {
    let dashed = movie.replace(' ', "-");
    vec![
        format!("/scripts/{}.html", urlencoding::encode(&dashed)),
        format!("/Movie%20Scripts/{}%20Script.html", urlencoding::encode(movie)),
        format!("/scripts/{}.html", urlencoding::encode(movie)),
    ]
}

/// Extract screenplay text from a script page. Returns `None` when the page
/// has no `td.scrtext` cell (IMSDB serves a generic page for unknown titles).
pub fn extract_script(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("td.scrtext").expect("scrtext selector");

    let cell = document.select(&selector).next()?;

    let text = cell
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if text.is_empty() { None } else { Some(text) }
}
