use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use gardenlink_remote::{ProxyFetcher, SearchOutcome, SearchThrottle, format_hits, parse_results, search_url};
use gardenlink_shared::Result;

use super::{Tool, str_arg};
use crate::progress::ProgressSink;

/// `webSearch`: key-less DuckDuckGo search through the content proxy.
pub struct WebSearchTool {
    fetcher: Option<Arc<ProxyFetcher>>,
    throttle: Arc<SearchThrottle>,
    progress: Arc<dyn ProgressSink>,
}

impl WebSearchTool {
    pub fn new(
        fetcher: Option<Arc<ProxyFetcher>>,
        throttle: Arc<SearchThrottle>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            fetcher,
            throttle,
            progress,
        }
    }

    async fn search(&self, fetcher: &ProxyFetcher, query: &str) -> Result<String> {
        let progress = &self.progress;
        self.throttle
            .acquire(|wait| {
                progress.notify(&format!(
                    "Throttling request... waiting {}ms",
                    wait.as_millis()
                ));
            })
            .await;

        let response = fetcher.fetch_response(&search_url(query), true).await?;
        debug!(status = %response.status, body_len = response.body.len(), "search page received");

        if !response.status.is_success() {
            return Ok(format!(
                "Error: Web search request via proxy failed with status {}. Details: {}",
                response.status.as_u16(),
                response.body
            ));
        }

        Ok(match parse_results(&response.body) {
            SearchOutcome::Hits(hits) => {
                self.progress
                    .notify(&format!("Found and parsed {} results.", hits.len()));
                format_hits(&hits)
            }
            SearchOutcome::NoResults => "No search results found for that query.".into(),
            SearchOutcome::Unrecognized => "Error: Failed to parse search results. The page \
                 structure may have changed or the request was blocked."
                .into(),
            SearchOutcome::NoLinks => {
                "Error: Parsed search results but could not extract any valid links.".into()
            }
        })
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "webSearch"
    }

    fn description(&self) -> &str {
        "Searches the web and returns every result with its title, URL and snippet. Use it to \
         discover URLs, then read them with readURL. Not for [[wikilinks]]. \
         Arguments: query (string)."
    }

    async fn call(&self, args: Value) -> Result<String> {
        let Some(query) = str_arg(&args, "query") else {
            return Ok("Error: A 'query' argument is required.".into());
        };
        let Some(fetcher) = &self.fetcher else {
            return Ok("Error: The Content Proxy URL is not set. This is required to make web \
                 requests. Please configure it under [proxy] in the config file."
                .into());
        };

        self.progress
            .notify(&format!("Searching the web for: \"{query}\""));

        match self.search(fetcher, query).await {
            Ok(output) => Ok(output),
            Err(e) => {
                warn!(query, error = %e, "web search failed");
                self.progress
                    .notify("An error occurred while searching the web.");
                Ok(format!(
                    "Error: An exception occurred while trying to perform the web search: {e}"
                ))
            }
        }
    }
}
