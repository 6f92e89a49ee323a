//! Test doubles for the collaborator traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use gardenlink_remote::RemoteFetcher;
use gardenlink_shared::{GardenError, Result};
use gardenlink_storage::DocumentStore;

use crate::completion::TextCompletion;
use crate::progress::ProgressSink;

/// In-memory gardens keyed by `(garden, path)`, recording every read.
pub(crate) struct MapStore {
    current: String,
    files: HashMap<(String, String), String>,
    reads: Mutex<Vec<String>>,
}

impl MapStore {
    pub(crate) fn new(files: &[(&str, &str, &str)]) -> Self {
        Self {
            current: "home".into(),
            files: files
                .iter()
                .map(|(g, p, c)| ((g.to_string(), p.to_string()), c.to_string()))
                .collect(),
            reads: Mutex::new(Vec::new()),
        }
    }

    /// Every `garden#path` read attempt, in order.
    pub(crate) fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }

    pub(crate) fn was_read(&self, garden: &str, path: &str) -> bool {
        let key = format!("{garden}#{path}");
        self.reads().iter().any(|r| *r == key)
    }
}

#[async_trait]
impl DocumentStore for MapStore {
    fn current_garden(&self) -> &str {
        &self.current
    }

    async fn gardens(&self) -> Result<Vec<String>> {
        let mut gardens: Vec<String> = self.files.keys().map(|(g, _)| g.clone()).collect();
        gardens.sort();
        gardens.dedup();
        Ok(gardens)
    }

    async fn read_file(&self, garden: &str, path: &str) -> Result<String> {
        self.reads.lock().unwrap().push(format!("{garden}#{path}"));
        self.files
            .get(&(garden.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| GardenError::Storage(format!("{garden}#{path} not found")))
    }

    async fn list_files(&self, garden: &str) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self
            .files
            .keys()
            .filter(|(g, _)| g == garden)
            .map(|(_, p)| p.clone())
            .collect();
        paths.sort();
        Ok(paths)
    }
}

/// Completion that records prompts and answers with a fixed reply.
pub(crate) struct ScriptedCompletion {
    reply: Result<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            reply: Err(GardenError::Completion(message.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletion for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(GardenError::Completion(e.to_string())),
        }
    }
}

/// Remote fetcher serving canned bodies; unknown URLs fail.
pub(crate) struct MapFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub(crate) fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(u, c)| (u.to_string(), c.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteFetcher for MapFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| GardenError::Network(format!("{url}: HTTP 404 Not Found")))
    }
}

/// Progress sink keeping every message and source.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    messages: Mutex<Vec<String>>,
    sources: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub(crate) fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn add_source(&self, url: &str) {
        self.sources.lock().unwrap().push(url.to_string());
    }
}
