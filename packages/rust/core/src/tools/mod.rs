//! Agent tools.
//!
//! Every tool takes a JSON argument object and answers with a string. Bad
//! arguments are answered with an `Error: ...` string rather than an `Err`, so
//! the calling agent can read and correct them. `Err` is reserved for failures
//! the caller must handle (e.g. the completion service being unavailable).

mod explore;
mod list_files;
mod memory;
mod read_file;
mod read_url;
mod web_search;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use gardenlink_remote::{ProxyFetcher, RemoteFetcher, SearchThrottle};
use gardenlink_shared::{GardenError, Result};
use gardenlink_storage::DocumentStore;

use crate::completion::TextCompletion;
use crate::explore::GraphTraversalAssembler;
use crate::progress::ProgressSink;

pub use explore::ExploreWikilinksTool;
pub use list_files::ListFilesTool;
pub use memory::RequestMemoryCompressionTool;
pub use read_file::ReadFileTool;
pub use read_url::ReadUrlTool;
pub use web_search::WebSearchTool;

/// A named operation callable with JSON arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn call(&self, args: Value) -> Result<String>;
}

/// Collaborators shared by the standard tool set.
#[derive(Clone)]
pub struct ToolContext {
    pub store: Arc<dyn DocumentStore>,
    pub completion: Arc<dyn TextCompletion>,
    /// Proxy for remote wikilinks and `readURL`.
    pub fetcher: Option<Arc<ProxyFetcher>>,
    /// Explicitly configured proxy; web search refuses to run without one.
    pub search_fetcher: Option<Arc<ProxyFetcher>>,
    /// Owned by the session, shared by every search call.
    pub throttle: Arc<SearchThrottle>,
    pub progress: Arc<dyn ProgressSink>,
}

/// Tools by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every built-in tool against `ctx`.
    pub fn with_standard_tools(ctx: &ToolContext) -> Self {
        let mut assembler =
            GraphTraversalAssembler::new(ctx.store.clone(), ctx.completion.clone())
                .with_progress(ctx.progress.clone());
        if let Some(fetcher) = &ctx.fetcher {
            assembler = assembler.with_fetcher(fetcher.clone() as Arc<dyn RemoteFetcher>);
        }

        let mut registry = Self::new();
        registry.register(ExploreWikilinksTool::new(assembler));
        registry.register(ListFilesTool::new(ctx.store.clone(), ctx.progress.clone()));
        registry.register(ReadFileTool::new(ctx.store.clone(), ctx.progress.clone()));
        registry.register(ReadUrlTool::new(ctx.fetcher.clone(), ctx.progress.clone()));
        registry.register(WebSearchTool::new(
            ctx.search_fetcher.clone(),
            ctx.throttle.clone(),
            ctx.progress.clone(),
        ));
        registry.register(RequestMemoryCompressionTool);
        registry
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// `(name, description)` of every tool, sorted by name.
    pub fn describe(&self) -> Vec<(&str, &str)> {
        self.tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect()
    }

    /// Invoke a tool by name.
    #[instrument(skip(self, args))]
    pub async fn call(&self, name: &str, args: Value) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| GardenError::input(format!("unknown tool: {name}")))?;
        let output = tool.call(args).await?;
        info!(output_len = output.len(), "tool finished");
        Ok(output)
    }
}

/// A non-empty string argument, if present.
pub(crate) fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
