//! `[[wikilink]]` extraction.

use std::sync::LazyLock;

use regex::Regex;

static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("valid wikilink regex"));

/// Extract wikilink tokens in order of appearance.
///
/// Duplicates are kept; callers deduplicate on [`crate::VisitKey`].
/// Surrounding whitespace inside the brackets is trimmed and blank links are skipped.
pub fn extract_wikilinks(text: &str) -> Vec<String> {
    WIKILINK_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let token = cap[1].trim();
            (!token.is_empty()).then(|| token.to_string())
        })
        .collect()
}
