use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use gardenlink_shared::Result;
use gardenlink_storage::{DocumentStore, rooted};

use super::Tool;
use crate::progress::ProgressSink;

/// `readFile`: raw content of one or more files, possibly from other gardens.
pub struct ReadFileTool {
    store: Arc<dyn DocumentStore>,
    progress: Arc<dyn ProgressSink>,
}

impl ReadFileTool {
    pub fn new(store: Arc<dyn DocumentStore>, progress: Arc<dyn ProgressSink>) -> Self {
        Self { store, progress }
    }

    /// Read `Garden#/path` or `/path` (current garden).
    async fn read_one(&self, identifier: &str) -> Result<String> {
        let (garden, path) = match identifier.split_once('#') {
            Some((garden, path)) => (garden, path),
            None => (self.store.current_garden(), identifier),
        };
        self.store.read_file(garden, &rooted(path)).await
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "readFile"
    }

    fn description(&self) -> &str {
        "Reads the full content of one or more files. Paths are either in the current garden \
         (\"/path/to/file.md\") or cross-garden (\"OtherGarden#/path/to/file.md\"). \
         Arguments: files (non-empty array of strings)."
    }

    async fn call(&self, args: Value) -> Result<String> {
        let paths: Vec<&str> = match args.get("files").and_then(Value::as_array) {
            Some(files) if !files.is_empty() => files.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if paths.is_empty() {
            return Ok(
                "Error: The 'files' argument must be a non-empty array of file paths.".into(),
            );
        }

        let mut combined = String::new();
        let mut files_read = 0;

        for path in &paths {
            self.progress.notify(&format!("Reading file: {path}"));

            let content = match self.read_one(path).await {
                Ok(content) => {
                    files_read += 1;
                    content
                }
                Err(e) => {
                    debug!(path, error = %e, "file read failed");
                    format!("Error reading \"{path}\": {e}")
                }
            };
            let _ = write!(combined, "--- Content from {path} ---\n{content}\n\n");
        }

        self.progress.notify(&format!(
            "Successfully read {files_read} of {} files.",
            paths.len()
        ));
        Ok(combined)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{MapStore, RecordingProgress};

    fn tool() -> (ReadFileTool, Arc<RecordingProgress>) {
        let store = Arc::new(MapStore::new(&[
            ("home", "/README.md", "readme"),
            ("Settings", "/settings/keymaps.yml", "keys: []"),
        ]));
        let progress = Arc::new(RecordingProgress::default());
        (ReadFileTool::new(store, progress.clone()), progress)
    }

    #[tokio::test]
    async fn reads_local_and_cross_garden_files() {
        let (tool, _) = tool();
        let out = tool
            .call(json!({"files": ["README.md", "Settings#/settings/keymaps.yml"]}))
            .await
            .unwrap();
        assert_eq!(
            out,
            "--- Content from README.md ---\nreadme\n\n\
             --- Content from Settings#/settings/keymaps.yml ---\nkeys: []\n\n"
        );
    }

    #[tokio::test]
    async fn isolates_failures_per_file() {
        let (tool, progress) = tool();
        let out = tool
            .call(json!({"files": ["/missing.md", "/README.md"]}))
            .await
            .unwrap();

        assert!(out.starts_with("--- Content from /missing.md ---\nError reading \"/missing.md\": "));
        assert!(out.ends_with("--- Content from /README.md ---\nreadme\n\n"));
        assert_eq!(
            progress.messages().last().unwrap(),
            "Successfully read 1 of 2 files."
        );
    }

    #[tokio::test]
    async fn requires_non_empty_file_list() {
        let (tool, _) = tool();
        for args in [json!({}), json!({"files": []}), json!({"files": "README.md"})] {
            let out = tool.call(args).await.unwrap();
            assert_eq!(
                out,
                "Error: The 'files' argument must be a non-empty array of file paths."
            );
        }
    }
}
