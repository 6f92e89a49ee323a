//! Garden document store.
//!
//! The [`DocumentStore`] trait is the only way the traversal and the file
//! tools touch garden content. [`GardenStore`] implements it over a directory
//! holding one subdirectory per garden.
//!
//! Cross-garden link resolution ([`DocumentStore::read_link_content`]) is a
//! provided method built on [`DocumentStore::read_file`], so alternative stores
//! only need to supply raw file access.

mod garden;

use async_trait::async_trait;
use tracing::debug;

use gardenlink_shared::{CrossReference, LinkContent, Result, extract_wikilinks};

pub use garden::{GardenStore, METADATA_DIR};

/// Read access to a set of named gardens.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Garden that unscoped references resolve against.
    fn current_garden(&self) -> &str;

    /// Every garden this store knows about.
    async fn gardens(&self) -> Result<Vec<String>>;

    /// Read a file by its garden-rooted path (e.g. `/notes/today.md`).
    async fn read_file(&self, garden: &str, path: &str) -> Result<String>;

    /// List every file in a garden, depth first, as garden-rooted paths.
    async fn list_files(&self, garden: &str) -> Result<Vec<String>>;

    /// Wikilink tokens in `text`, in order of appearance, duplicates kept.
    fn extract_cross_references(&self, text: &str) -> Vec<String> {
        extract_wikilinks(text)
    }

    /// Resolve a wikilink token relative to `garden`.
    ///
    /// `Other#/path` switches garden. A trailing `|alias` is ignored and a
    /// missing `.md` extension is tried as a fallback. Every failure yields
    /// absent content.
    async fn read_link_content(&self, token: &str, garden: &str) -> LinkContent {
        let (target_garden, raw_path) = match CrossReference::parse(token) {
            CrossReference::Scoped { garden, path } => (garden, path),
            CrossReference::Local(path) => (garden, path),
            CrossReference::Remote(url) => return LinkContent::missing(url, garden),
        };

        let path = link_path(raw_path);
        for candidate in path_candidates(&path) {
            match self.read_file(target_garden, &candidate).await {
                Ok(content) => {
                    return LinkContent {
                        content: Some(content),
                        full_identifier: format!("{target_garden}#{candidate}"),
                        garden: target_garden.to_string(),
                    };
                }
                Err(e) => {
                    debug!(garden = target_garden, path = %candidate, error = %e, "link candidate unreadable");
                }
            }
        }

        LinkContent::missing(format!("{target_garden}#{path}"), target_garden)
    }
}

/// Garden-rooted path for a link target: alias dropped, leading `/` ensured.
pub fn link_path(raw: &str) -> String {
    let target = raw.split('|').next().unwrap_or(raw).trim();
    rooted(target)
}

/// Ensure a path within a garden starts with `/`.
pub fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

fn path_candidates(path: &str) -> Vec<String> {
    if path.ends_with(".md") {
        vec![path.to_string()]
    } else {
        vec![path.to_string(), format!("{path}.md")]
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use gardenlink_shared::GardenError;

    use super::*;

    /// In-memory store keyed by `(garden, path)`.
    struct MapStore {
        files: HashMap<(String, String), String>,
    }

    impl MapStore {
        fn new(files: &[(&str, &str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(g, p, c)| ((g.to_string(), p.to_string()), c.to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for MapStore {
        fn current_garden(&self) -> &str {
            "home"
        }

        async fn gardens(&self) -> Result<Vec<String>> {
            Ok(vec!["home".into(), "Other".into()])
        }

        async fn read_file(&self, garden: &str, path: &str) -> Result<String> {
            self.files
                .get(&(garden.to_string(), path.to_string()))
                .cloned()
                .ok_or_else(|| GardenError::Storage(format!("{garden}#{path} not found")))
        }

        async fn list_files(&self, _garden: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn link_path_normalizes_target() {
        assert_eq!(link_path("README"), "/README");
        assert_eq!(link_path("/notes/a.md"), "/notes/a.md");
        assert_eq!(link_path("Agentic Loop|the loop"), "/Agentic Loop");
    }

    #[tokio::test]
    async fn resolves_local_link_with_md_fallback() {
        let store = MapStore::new(&[("home", "/README.md", "# Readme")]);
        let result = store.read_link_content("README", "home").await;
        assert_eq!(result.content.as_deref(), Some("# Readme"));
        assert_eq!(result.full_identifier, "home#/README.md");
        assert_eq!(result.garden, "home");
    }

    #[tokio::test]
    async fn resolves_scoped_link_into_other_garden() {
        let store = MapStore::new(&[("Other", "/deep/note", "other content")]);
        let result = store.read_link_content("Other#/deep/note", "home").await;
        assert_eq!(result.content.as_deref(), Some("other content"));
        assert_eq!(result.full_identifier, "Other#/deep/note");
        assert_eq!(result.garden, "Other");
    }

    #[tokio::test]
    async fn missing_link_has_no_content() {
        let store = MapStore::new(&[]);
        let result = store.read_link_content("Nowhere", "home").await;
        assert!(result.content.is_none());
        assert_eq!(result.garden, "home");
    }

    #[tokio::test]
    async fn remote_token_is_not_resolved_from_gardens() {
        let store = MapStore::new(&[("home", "/https://example.com", "nope")]);
        let result = store.read_link_content("https://example.com", "home").await;
        assert!(result.content.is_none());
    }

    #[test]
    fn default_extraction_uses_wikilinks() {
        let store = MapStore::new(&[]);
        assert_eq!(store.extract_cross_references("[[a]] [[b]]"), vec!["a", "b"]);
    }
}
