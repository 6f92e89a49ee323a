use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use gardenlink_remote::ProxyFetcher;
use gardenlink_shared::{Result, is_remote};

use super::{Tool, str_arg};
use crate::progress::ProgressSink;

/// `readURL`: text of a single web page, fetched through the content proxy.
pub struct ReadUrlTool {
    fetcher: Option<Arc<ProxyFetcher>>,
    progress: Arc<dyn ProgressSink>,
}

impl ReadUrlTool {
    pub fn new(fetcher: Option<Arc<ProxyFetcher>>, progress: Arc<dyn ProgressSink>) -> Self {
        Self { fetcher, progress }
    }
}

#[async_trait]
impl Tool for ReadUrlTool {
    fn name(&self) -> &str {
        "readURL"
    }

    fn description(&self) -> &str {
        "Reads the full text content of one external web page. \
         Arguments: url (string starting with http)."
    }

    async fn call(&self, args: Value) -> Result<String> {
        let Some(url) = str_arg(&args, "url").filter(|u| is_remote(u)) else {
            return Ok("Error: A valid 'url' argument starting with http is required.".into());
        };
        let Some(fetcher) = &self.fetcher else {
            return Ok("Error: The Content Proxy URL is not set.".into());
        };

        self.progress.notify(&format!("Reading URL: {url}"));

        match fetcher.fetch_response(url, false).await {
            Ok(response) if response.status.is_success() => {
                self.progress.add_source(url);
                self.progress.notify("Successfully read URL content.");
                Ok(response.body)
            }
            Ok(response) => Ok(format!(
                "Error: Failed to fetch the URL. Status: {}",
                response.status
            )),
            Err(e) => {
                warn!(url, error = %e, "URL read failed");
                self.progress
                    .notify("An error occurred while reading the URL.");
                Ok(format!(
                    "Error: An exception occurred while trying to fetch the URL: {e}"
                ))
            }
        }
    }
}
