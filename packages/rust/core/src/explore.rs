//! Wikilink graph traversal and knowledge assembly.
//!
//! Starting from text containing `[[wikilinks]]`, the assembler walks the
//! link graph breadth first across gardens, collects every document it can
//! resolve into a [`KnowledgeBuffer`], and finally asks a [`TextCompletion`]
//! to keep only the blocks relevant to the caller's goal.
//!
//! The walk is a single FIFO work queue of `(token, depth, garden)` entries.
//! Children are appended only after their parent has been fully processed, so
//! the buffer is in level order. Each entry is checked in a fixed order:
//! depth first, then the visited set, then resolution. Entries at
//! [`MAX_DEPTH`] or deeper are never fetched.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use gardenlink_remote::RemoteFetcher;
use gardenlink_shared::{GardenError, KnowledgeBuffer, QueueEntry, Result, VisitKey, is_remote};
use gardenlink_storage::DocumentStore;

use crate::completion::TextCompletion;
use crate::progress::{ProgressSink, SilentProgress};

/// Entries at this depth or deeper are dropped before fetching.
pub const MAX_DEPTH: u32 = 2;

/// Content resolved for one queue entry.
struct Resolved {
    identifier: String,
    content: String,
    garden: String,
}

/// Counters for the traversal summary log.
#[derive(Debug, Default)]
struct WalkStats {
    fetched: usize,
    too_deep: usize,
    duplicate: usize,
    unresolved: usize,
}

/// Breadth-first, depth-limited wikilink walker with relevance filtering.
pub struct GraphTraversalAssembler {
    store: Arc<dyn DocumentStore>,
    completion: Arc<dyn TextCompletion>,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
    progress: Arc<dyn ProgressSink>,
}

impl GraphTraversalAssembler {
    pub fn new(store: Arc<dyn DocumentStore>, completion: Arc<dyn TextCompletion>) -> Self {
        Self {
            store,
            completion,
            fetcher: None,
            progress: Arc::new(SilentProgress),
        }
    }

    /// Resolve URL-shaped links through this fetcher. Without one they yield no content.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// Walk the links in `initial_content`, then filter the result against `goal`.
    ///
    /// Fails with [`GardenError::Input`] before doing any work when either
    /// argument is empty. Completion failures propagate; per-link failures never do.
    #[instrument(skip_all, fields(garden = %self.store.current_garden()))]
    pub async fn assemble(&self, goal: &str, initial_content: &str) -> Result<String> {
        if goal.is_empty() || initial_content.is_empty() {
            return Err(GardenError::input("'goal' and 'initialContent' are required."));
        }

        let buffer = self.collect(initial_content).await;

        self.progress
            .notify("All links explored. Filtering for relevance...");
        let prompt = relevance_prompt(goal, &buffer);
        let filtered = self.completion.complete(&prompt).await?;
        self.progress.notify("Relevance filtering complete.");

        info!(
            blocks = buffer.len(),
            prompt_len = prompt.len(),
            filtered_len = filtered.len(),
            "knowledge assembled"
        );
        Ok(filtered)
    }

    /// Run the traversal alone and return the unfiltered buffer.
    #[instrument(skip_all, fields(garden = %self.store.current_garden()))]
    pub async fn collect(&self, initial_content: &str) -> KnowledgeBuffer {
        let mut buffer = KnowledgeBuffer::with_initial(initial_content);
        let mut visited: HashSet<VisitKey> = HashSet::new();
        let mut stats = WalkStats::default();

        let garden = self.store.current_garden().to_string();
        let mut queue: VecDeque<QueueEntry> = self
            .store
            .extract_cross_references(initial_content)
            .into_iter()
            .map(|token| QueueEntry {
                token,
                depth: 0,
                garden: garden.clone(),
            })
            .collect();

        info!(seeds = queue.len(), max_depth = MAX_DEPTH, "starting link exploration");
        self.progress.notify(&format!(
            "Exploring {} link(s) from the initial content...",
            queue.len()
        ));

        while let Some(entry) = queue.pop_front() {
            if entry.token.is_empty() || entry.depth >= MAX_DEPTH {
                stats.too_deep += 1;
                continue;
            }

            if !visited.insert(entry.visit_key()) {
                stats.duplicate += 1;
                continue;
            }

            self.progress
                .notify(&format!("Exploring link: {}", entry.token));

            let Some(resolved) = self.resolve(&entry).await else {
                stats.unresolved += 1;
                continue;
            };
            stats.fetched += 1;

            let next_links = self.store.extract_cross_references(&resolved.content);
            debug!(
                token = %entry.token,
                depth = entry.depth,
                identifier = %resolved.identifier,
                links = next_links.len(),
                "link resolved"
            );
            if !next_links.is_empty() {
                self.progress
                    .notify(&format!("... found {} new links.", next_links.len()));
            }

            for token in next_links {
                let key = VisitKey::new(resolved.garden.clone(), token.clone());
                if !visited.contains(&key) {
                    queue.push_back(QueueEntry {
                        token,
                        depth: entry.depth + 1,
                        garden: resolved.garden.clone(),
                    });
                }
            }

            buffer.push(resolved.identifier, resolved.content);
        }

        info!(
            fetched = stats.fetched,
            too_deep = stats.too_deep,
            duplicate = stats.duplicate,
            unresolved = stats.unresolved,
            "link exploration finished"
        );
        buffer
    }

    /// Fetch the content behind one entry. `None` means the entry contributes nothing.
    async fn resolve(&self, entry: &QueueEntry) -> Option<Resolved> {
        if is_remote(&entry.token) {
            let Some(fetcher) = &self.fetcher else {
                debug!(url = %entry.token, "no remote fetcher configured, skipping");
                return None;
            };
            return match fetcher.fetch_text(&entry.token).await {
                Ok(content) if !content.is_empty() => {
                    self.progress.add_source(&entry.token);
                    Some(Resolved {
                        identifier: entry.token.clone(),
                        content,
                        garden: entry.garden.clone(),
                    })
                }
                Ok(_) => None,
                Err(e) => {
                    warn!(url = %entry.token, error = %e, "remote link unavailable");
                    None
                }
            };
        }

        let link = self
            .store
            .read_link_content(&entry.token, &entry.garden)
            .await;
        match link.content {
            Some(content) if !content.is_empty() => Some(Resolved {
                identifier: link.full_identifier,
                content,
                garden: link.garden,
            }),
            _ => {
                debug!(token = %entry.token, garden = %entry.garden, "link not found");
                None
            }
        }
    }
}

/// Prompt asking the completion service to drop blocks unrelated to `goal`.
pub fn relevance_prompt(goal: &str, buffer: &KnowledgeBuffer) -> String {
    format!(
        "User Goal: \"{goal}\"\n\
         Based ONLY on the User Goal, review the following knowledge base I have assembled. \
         Remove any \"Content from...\" sections that are NOT relevant to the goal. \
         Keep the remaining sections exactly as written. \
         Return only the filtered, relevant content.\n\
         \n\
         Knowledge Base:\n\
         {buffer}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MapFetcher, MapStore, RecordingProgress, ScriptedCompletion};

    fn assembler(store: &Arc<MapStore>, completion: &Arc<ScriptedCompletion>) -> GraphTraversalAssembler {
        GraphTraversalAssembler::new(store.clone(), completion.clone())
    }

    #[tokio::test]
    async fn no_links_still_filters_initial_block() {
        let store = Arc::new(MapStore::new(&[]));
        let completion = Arc::new(ScriptedCompletion::replying("filtered"));

        let walker = assembler(&store, &completion);
        let buffer = walker.collect("plain text").await;
        assert_eq!(buffer.len(), 1);

        let out = walker.assemble("goal", "plain text").await.unwrap();
        assert_eq!(out, "filtered");

        let prompts = completion.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("User Goal: \"goal\""));
        assert!(prompts[0].contains("--- Initial Content ---\nplain text\n\n"));
        assert!(store.reads().is_empty());
    }

    #[tokio::test]
    async fn follows_chain_to_leaf() {
        let store = Arc::new(MapStore::new(&[
            ("home", "/A", "[[B]]"),
            ("home", "/B", "no links here"),
        ]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let buffer = assembler(&store, &completion).collect("[[A]]").await;
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.sources(), vec!["home#/A", "home#/B"]);
        assert_eq!(buffer.blocks()[2].content, "no links here");
    }

    #[tokio::test]
    async fn duplicate_seed_is_expanded_once() {
        let store = Arc::new(MapStore::new(&[("home", "/A", "alpha")]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let buffer = assembler(&store, &completion).collect("[[A]] [[A]]").await;
        assert_eq!(buffer.sources(), vec!["home#/A"]);
        assert_eq!(store.reads(), vec!["home#/A"]);
    }

    #[tokio::test]
    async fn never_fetches_at_max_depth() {
        let store = Arc::new(MapStore::new(&[
            ("home", "/A", "[[B]]"),
            ("home", "/B", "[[C]]"),
            ("home", "/C", "too deep"),
        ]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let buffer = assembler(&store, &completion).collect("[[A]]").await;
        assert_eq!(buffer.sources(), vec!["home#/A", "home#/B"]);
        assert!(!store.was_read("home", "/C"));
        assert!(!store.was_read("home", "/C.md"));
    }

    #[tokio::test]
    async fn failed_link_does_not_stop_siblings() {
        let store = Arc::new(MapStore::new(&[
            ("home", "/A", "alpha [[Child]]"),
            ("home", "/Child", "child"),
        ]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let buffer = assembler(&store, &completion)
            .collect("[[Missing]] [[A]]")
            .await;
        assert_eq!(buffer.sources(), vec!["home#/A", "home#/Child"]);
        assert!(store.was_read("home", "/Missing.md"));
    }

    #[tokio::test]
    async fn missing_link_expands_nothing() {
        let store = Arc::new(MapStore::new(&[("home", "/B", "b")]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        // "[[B]]" inside the unresolved target can never be discovered.
        let buffer = assembler(&store, &completion).collect("[[Missing]]").await;
        assert_eq!(buffer.len(), 1);
        assert!(!store.was_read("home", "/B"));
    }

    #[tokio::test]
    async fn children_resolve_in_the_resolved_garden() {
        let store = Arc::new(MapStore::new(&[
            ("Other", "/X", "see [[Y]]"),
            ("Other", "/Y", "why"),
            ("home", "/Y", "wrong garden"),
        ]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let buffer = assembler(&store, &completion)
            .collect("[[Other#/X]]")
            .await;
        assert_eq!(buffer.sources(), vec!["Other#/X", "Other#/Y"]);
        assert!(!store.was_read("home", "/Y"));
    }

    #[tokio::test]
    async fn same_token_in_two_gardens_is_two_visits() {
        let store = Arc::new(MapStore::new(&[
            ("Other", "/N", "[[Shared]]"),
            ("Other", "/Shared", "other shared"),
            ("home", "/Shared", "home shared"),
        ]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let buffer = assembler(&store, &completion)
            .collect("[[Shared]] [[Other#/N]]")
            .await;
        assert_eq!(
            buffer.sources(),
            vec!["home#/Shared", "Other#/N", "Other#/Shared"]
        );
    }

    #[tokio::test]
    async fn discovery_is_level_order() {
        let store = Arc::new(MapStore::new(&[
            ("home", "/A", "[[C]]"),
            ("home", "/B", "[[D]]"),
            ("home", "/C", "c"),
            ("home", "/D", "d"),
        ]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let buffer = assembler(&store, &completion).collect("[[A]] [[B]]").await;
        assert_eq!(
            buffer.sources(),
            vec!["home#/A", "home#/B", "home#/C", "home#/D"]
        );
    }

    #[tokio::test]
    async fn failing_remote_link_is_skipped() {
        let store = Arc::new(MapStore::new(&[("home", "/A", "alpha")]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));
        let fetcher = Arc::new(MapFetcher::new(&[]));

        let buffer = assembler(&store, &completion)
            .with_fetcher(fetcher.clone())
            .collect("[[http://example.com]] [[A]]")
            .await;
        assert_eq!(buffer.sources(), vec!["home#/A"]);
        assert_eq!(fetcher.requests(), vec!["http://example.com"]);
    }

    #[tokio::test]
    async fn remote_link_without_fetcher_is_skipped() {
        let store = Arc::new(MapStore::new(&[]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let buffer = assembler(&store, &completion)
            .collect("[[https://example.com/page]]")
            .await;
        assert_eq!(buffer.len(), 1);
        assert!(store.reads().is_empty());
    }

    #[tokio::test]
    async fn remote_content_is_expanded_and_cited() {
        let store = Arc::new(MapStore::new(&[("home", "/Local", "local note")]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));
        let fetcher = Arc::new(MapFetcher::new(&[(
            "https://example.com/page",
            "remote text with [[Local]]",
        )]));
        let progress = Arc::new(RecordingProgress::default());

        let buffer = assembler(&store, &completion)
            .with_fetcher(fetcher)
            .with_progress(progress.clone())
            .collect("[[https://example.com/page]]")
            .await;

        assert_eq!(
            buffer.sources(),
            vec!["https://example.com/page", "home#/Local"]
        );
        assert_eq!(progress.sources(), vec!["https://example.com/page"]);
    }

    #[tokio::test]
    async fn reports_progress_through_the_run() {
        let store = Arc::new(MapStore::new(&[
            ("home", "/A", "[[B]] [[C]]"),
            ("home", "/B", "b"),
            ("home", "/C", "c"),
        ]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));
        let progress = Arc::new(RecordingProgress::default());

        assembler(&store, &completion)
            .with_progress(progress.clone())
            .assemble("goal", "[[A]]")
            .await
            .unwrap();

        let messages = progress.messages();
        assert_eq!(messages.first().map(String::as_str), Some("Exploring 1 link(s) from the initial content..."));
        assert!(messages.contains(&"Exploring link: A".to_string()));
        assert!(messages.contains(&"... found 2 new links.".to_string()));
        assert_eq!(
            &messages[messages.len() - 2..],
            &[
                "All links explored. Filtering for relevance...".to_string(),
                "Relevance filtering complete.".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn missing_input_fails_before_traversal() {
        let store = Arc::new(MapStore::new(&[("home", "/A", "alpha")]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));
        let walker = assembler(&store, &completion);

        let err = walker.assemble("", "[[A]]").await.unwrap_err();
        assert!(matches!(err, GardenError::Input { .. }));

        let err = walker.assemble("goal", "").await.unwrap_err();
        assert!(matches!(err, GardenError::Input { .. }));

        assert!(store.reads().is_empty());
        assert!(completion.prompts().is_empty());
    }

    #[tokio::test]
    async fn whitespace_input_is_still_explored() {
        let store = Arc::new(MapStore::new(&[("home", "/A", "alpha")]));
        let completion = Arc::new(ScriptedCompletion::replying("ok"));

        let out = assembler(&store, &completion)
            .assemble("   ", " \n ")
            .await
            .unwrap();
        assert_eq!(out, "ok");
        assert_eq!(completion.prompts().len(), 1);
    }

    #[tokio::test]
    async fn completion_failure_propagates() {
        let store = Arc::new(MapStore::new(&[]));
        let completion = Arc::new(ScriptedCompletion::failing("quota exceeded"));

        let err = assembler(&store, &completion)
            .assemble("goal", "text")
            .await
            .unwrap_err();
        assert!(matches!(err, GardenError::Completion(_)));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn prompt_embeds_goal_and_buffer() {
        let mut buffer = KnowledgeBuffer::with_initial("start");
        buffer.push("home#/A", "alpha");
        let prompt = relevance_prompt("learn about A", &buffer);
        assert!(prompt.starts_with("User Goal: \"learn about A\"\n"));
        assert!(prompt.ends_with("--- Content from home#/A ---\nalpha\n\n"));
    }
}
