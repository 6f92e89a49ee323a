//! Remote content access through the content proxy.
//!
//! This crate provides:
//! - [`RemoteFetcher`] — the seam the traversal uses for URL-shaped wikilinks
//! - [`ProxyFetcher`] — reqwest client that routes every request through the proxy
//! - [`SearchThrottle`] — minimum-interval gate for outbound web searches
//! - [`search`] — DuckDuckGo HTML result parsing

pub mod search;
mod throttle;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use gardenlink_shared::{GardenError, Result};

pub use search::{SearchHit, SearchOutcome, format_hits, parse_results, search_url};
pub use throttle::SearchThrottle;

/// User-Agent string for proxy requests.
const USER_AGENT: &str = concat!("gardenlink/", env!("CARGO_PKG_VERSION"));

/// Query parameter carrying the target URL.
const PROXY_PARAM: &str = "thoughtformgardenproxy";

/// Query parameter asking the proxy to render the page in a headless browser.
const HEADLESS_PARAM: &str = "forceheadless";

/// Default timeout in seconds for proxied requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches the text of an absolute URL.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Raw proxy answer, for callers that report non-success statuses themselves.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub body: String,
}

// ---------------------------------------------------------------------------
// ProxyFetcher
// ---------------------------------------------------------------------------

/// Sends every request to `<proxy>?thoughtformgardenproxy=<target>`.
#[derive(Debug, Clone)]
pub struct ProxyFetcher {
    client: Client,
    base_url: Url,
}

impl ProxyFetcher {
    /// Create a fetcher for the given proxy base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim()).map_err(|e| {
            GardenError::config(format!("invalid proxy URL '{base_url}': {e}"))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GardenError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// The proxied URL for `target`.
    pub fn proxy_url(&self, target: &str, force_headless: bool) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(PROXY_PARAM, target);
            if force_headless {
                pairs.append_pair(HEADLESS_PARAM, "true");
            }
        }
        url
    }

    /// Fetch `target` through the proxy, returning status and body regardless of status.
    #[instrument(skip(self))]
    pub async fn fetch_response(&self, target: &str, force_headless: bool) -> Result<ProxyResponse> {
        let url = self.proxy_url(target, force_headless);
        debug!(%url, "proxy request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GardenError::Network(format!("{target}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GardenError::Network(format!("{target}: body read failed: {e}")))?;

        Ok(ProxyResponse { status, body })
    }
}

#[async_trait]
impl RemoteFetcher for ProxyFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.fetch_response(url, false).await?;
        if !response.status.is_success() {
            return Err(GardenError::Network(format!(
                "{url}: HTTP {}",
                response.status
            )));
        }
        Ok(response.body)
    }
}
