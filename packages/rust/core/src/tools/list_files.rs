use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use gardenlink_shared::Result;
use gardenlink_storage::DocumentStore;

use super::Tool;
use crate::progress::ProgressSink;

/// `listFiles`: every file in the current garden, or in all gardens.
pub struct ListFilesTool {
    store: Arc<dyn DocumentStore>,
    progress: Arc<dyn ProgressSink>,
}

impl ListFilesTool {
    pub fn new(store: Arc<dyn DocumentStore>, progress: Arc<dyn ProgressSink>) -> Self {
        Self { store, progress }
    }

    /// Unreadable gardens list as empty.
    async fn files_in(&self, garden: &str) -> Vec<String> {
        match self.store.list_files(garden).await {
            Ok(files) => files,
            Err(e) => {
                warn!(garden, error = %e, "garden could not be listed");
                Vec::new()
            }
        }
    }

    async fn list_current(&self) -> String {
        let garden = self.store.current_garden().to_string();
        self.progress
            .notify(&format!("Listing files in current garden: {garden}..."));

        let files = self.files_in(&garden).await;
        self.progress.notify(&format!("Found {} files.", files.len()));
        format!("Files in garden \"{garden}\":\n{}", files.join("\n"))
    }

    async fn list_all(&self) -> Result<String> {
        self.progress.notify("Listing files across all gardens...");
        let gardens = self.store.gardens().await?;

        let mut output = String::from("List of all files across all gardens:\n");
        let mut total = 0;
        for garden in &gardens {
            self.progress
                .notify(&format!("... scanning garden: {garden}"));
            let files = self.files_in(garden).await;
            total += files.len();
            for file in files {
                let _ = writeln!(output, "{garden}#{file}");
            }
        }

        self.progress.notify(&format!(
            "Found {total} files across {} gardens.",
            gardens.len()
        ));
        Ok(output)
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "listFiles"
    }

    fn description(&self) -> &str {
        "Lists every file in the current garden (scope \"current\", the default) or across all \
         gardens as Garden#/path (scope \"all\"). Arguments: scope (optional string)."
    }

    async fn call(&self, args: Value) -> Result<String> {
        let scope = args
            .get("scope")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("current");

        match scope {
            "current" => Ok(self.list_current().await),
            "all" => self.list_all().await,
            _ => Ok("Error: Invalid scope. Use \"current\" or \"all\".".into()),
        }
    }
}
