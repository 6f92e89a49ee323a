//! Core domain types for garden link traversal.

use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CrossReference
// ---------------------------------------------------------------------------

/// A classified wikilink token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossReference<'a> {
    /// Absolute web URL, resolved through the content proxy.
    Remote(&'a str),
    /// `<garden>#<path>`, resolved in a named garden.
    Scoped { garden: &'a str, path: &'a str },
    /// Bare name or path, resolved in the owning garden.
    Local(&'a str),
}

impl<'a> CrossReference<'a> {
    /// Classify a raw token. Only the first `#` separates garden from path.
    pub fn parse(token: &'a str) -> Self {
        if is_remote(token) {
            return Self::Remote(token);
        }
        match token.split_once('#') {
            Some(("", path)) => Self::Local(path),
            Some((garden, path)) => Self::Scoped { garden, path },
            None => Self::Local(token),
        }
    }
}

/// Whether a token should be fetched over the network rather than from a garden.
pub fn is_remote(token: &str) -> bool {
    token.starts_with("http")
}

// ---------------------------------------------------------------------------
// Traversal bookkeeping
// ---------------------------------------------------------------------------

/// Deduplication identity: owning garden plus the literal token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitKey {
    pub garden: String,
    pub token: String,
}

impl VisitKey {
    pub fn new(garden: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            garden: garden.into(),
            token: token.into(),
        }
    }
}

impl fmt::Display for VisitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.garden, self.token)
    }
}

/// A pending unit of traversal work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Raw wikilink token.
    pub token: String,
    /// Hops from the initial content (seeds are depth 0).
    pub depth: u32,
    /// Garden the token is resolved against.
    pub garden: String,
}

impl QueueEntry {
    pub fn visit_key(&self) -> VisitKey {
        VisitKey::new(self.garden.clone(), self.token.clone())
    }
}

/// Outcome of resolving a wikilink against a document store.
///
/// `content == None` means "not found", never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContent {
    pub content: Option<String>,
    /// Canonical `<garden>#<path>` of the resolved document.
    pub full_identifier: String,
    /// Garden the document lives in; children of this document resolve there.
    pub garden: String,
}

impl LinkContent {
    pub fn missing(full_identifier: impl Into<String>, garden: impl Into<String>) -> Self {
        Self {
            content: None,
            full_identifier: full_identifier.into(),
            garden: garden.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// KnowledgeBuffer
// ---------------------------------------------------------------------------

/// Where a knowledge block came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BlockSource {
    /// The caller-supplied starting text.
    Initial,
    /// A resolved document or remote URL.
    Link(String),
}

/// One content block in the knowledge buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeBlock {
    pub source: BlockSource,
    pub content: String,
}

impl fmt::Display for KnowledgeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            BlockSource::Initial => write!(f, "--- Initial Content ---\n{}\n\n", self.content),
            BlockSource::Link(id) => {
                write!(f, "--- Content from {id} ---\n{}\n\n", self.content)
            }
        }
    }
}

/// Ordered, append-only accumulation of content blocks in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KnowledgeBuffer {
    blocks: Vec<KnowledgeBlock>,
}

impl KnowledgeBuffer {
    /// Start a buffer whose block 0 is the initial content.
    pub fn with_initial(content: impl Into<String>) -> Self {
        Self {
            blocks: vec![KnowledgeBlock {
                source: BlockSource::Initial,
                content: content.into(),
            }],
        }
    }

    pub fn push(&mut self, identifier: impl Into<String>, content: impl Into<String>) {
        self.blocks.push(KnowledgeBlock {
            source: BlockSource::Link(identifier.into()),
            content: content.into(),
        });
    }

    pub fn blocks(&self) -> &[KnowledgeBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Identifiers of every linked block, in order.
    pub fn sources(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match &b.source {
                BlockSource::Link(id) => Some(id.as_str()),
                BlockSource::Initial => None,
            })
            .collect()
    }
}

impl fmt::Display for KnowledgeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}
