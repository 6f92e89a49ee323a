//! DuckDuckGo HTML search result parsing.
//!
//! The key-less `html.duckduckgo.com` endpoint wraps every result link in a
//! `/l/?uddg=<target>` redirect; parsing unwraps it back to the target URL.

use std::fmt::Write as _;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

/// Search endpoint.
const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Base for resolving protocol-relative redirect links.
const REDIRECT_BASE: &str = "https://duckduckgo.com/";

static RESULT_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result").expect("valid selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result__a").expect("valid selector"));
static SNIPPET_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result__snippet").expect("valid selector"));

/// A single parsed search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Outcome of parsing a results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// At least one result with a usable link.
    Hits(Vec<SearchHit>),
    /// The page explicitly reports no results.
    NoResults,
    /// No result nodes at all; layout changed or the request was blocked.
    Unrecognized,
    /// Result nodes were present but none carried an extractable link.
    NoLinks,
}

/// Build the search URL for a query.
pub fn search_url(query: &str) -> String {
    let mut url = Url::parse(SEARCH_ENDPOINT).expect("valid search endpoint");
    url.query_pairs_mut().append_pair("q", query);
    url.into()
}

/// Parse a DuckDuckGo HTML results page. Every result is kept.
pub fn parse_results(html: &str) -> SearchOutcome {
    let doc = Html::parse_document(html);
    let results: Vec<_> = doc.select(&RESULT_SEL).collect();

    if results.is_empty() {
        return if html.contains("No results found") {
            SearchOutcome::NoResults
        } else {
            SearchOutcome::Unrecognized
        };
    }

    let hits: Vec<SearchHit> = results
        .into_iter()
        .filter_map(|result| {
            let title_el = result.select(&TITLE_SEL).next()?;
            let snippet_el = result.select(&SNIPPET_SEL).next()?;
            let url = unwrap_redirect(title_el.value().attr("href")?)?;

            Some(SearchHit {
                title: title_el.text().collect::<String>().trim().to_string(),
                url,
                snippet: snippet_el.text().collect::<String>().trim().to_string(),
            })
        })
        .collect();

    if hits.is_empty() {
        SearchOutcome::NoLinks
    } else {
        SearchOutcome::Hits(hits)
    }
}

/// Render hits as a numbered Markdown list.
pub fn format_hits(hits: &[SearchHit]) -> String {
    let mut out = String::from("Here are the search results:\n\n");
    for (i, hit) in hits.iter().enumerate() {
        let _ = writeln!(out, "{}. [{}]({})", i + 1, hit.title, hit.url);
        let _ = write!(out, "   - Snippet: {}\n\n", hit.snippet);
    }
    out
}

/// Extract the `uddg` target from a result redirect link.
fn unwrap_redirect(href: &str) -> Option<String> {
    let base = Url::parse(REDIRECT_BASE).ok()?;
    let link = base.join(href).ok()?;
    link.query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
