//! Substring search over the corpus with windowed snippet extraction.
//!
//! Matching is case-insensitive substring containment across a selectable
//! set of fields (title, tags, content), OR-combined. Results keep the
//! corpus load order; there is no relevance ranking.
//!
//! Known quirk, kept intentionally: the snippet is always computed against
//! the article *body*, even when the match that qualified the article was on
//! its title or tags. Such a snippet simply shows the start of the body.

use serde::{Deserialize, Serialize};

use crate::corpus::Article;

/// Characters of context kept on each side of the first match.
pub const SNIPPET_RADIUS: usize = 60;

/// A searchable article field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    /// The front-matter title.
    Title,
    /// The front-matter tags.
    Tags,
    /// The article body.
    Content,
}

impl SearchField {
    /// All fields, the default selection.
    pub const ALL: [Self; 3] = [Self::Title, Self::Tags, Self::Content];
}

/// One search hit: a projection of the matching article.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Article title.
    pub title: String,
    /// Tags in declaration order.
    pub tags: Vec<String>,
    /// Last modification date, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    /// Bounded-width excerpt of the body around the first match.
    pub snippet: String,
}

/// Searches `articles` for `query` in the requested `fields`.
///
/// An empty or whitespace-only query yields no results. Output preserves the
/// input order.
#[must_use]
pub fn search(articles: &[Article], query: &str, fields: &[SearchField]) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    articles
        .iter()
        .filter(|a| matches(a, &needle, fields))
        .map(|a| SearchResult {
            title: a.meta.title.clone(),
            tags: a.meta.tags.clone(),
            lastmod: a.meta.lastmod.clone(),
            snippet: make_snippet(&a.body, &needle, SNIPPET_RADIUS),
        })
        .collect()
}

/// Whether the article contains the (already lowercased) needle in any of
/// the requested fields.
fn matches(article: &Article, needle: &str, fields: &[SearchField]) -> bool {
    fields.iter().any(|field| match field {
        SearchField::Title => article.meta.title.to_lowercase().contains(needle),
        SearchField::Tags => article
            .meta
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(needle)),
        SearchField::Content => article.body.to_lowercase().contains(needle),
    })
}

/// Extracts a window of `radius` characters of context around the first
/// case-insensitive occurrence of `needle` in `body`.
///
/// When the needle does not occur in the body at all, the first `2×radius`
/// characters are returned instead, with a trailing `...` if truncated.
/// Ellipses mark whichever window edges are not at the body's boundaries.
#[must_use]
pub fn make_snippet(body: &str, needle: &str, radius: usize) -> String {
    let lowered = body.to_lowercase();
    let needle = needle.to_lowercase();

    let Some(index) = lowered.find(&needle) else {
        let cut = floor_char_boundary(body, 2 * radius);
        let mut head = body[..cut].to_string();
        if body.len() > cut {
            head.push_str("...");
        }
        return head;
    };

    // The byte offset comes from the lowercase fold; for the scripts this
    // corpus carries the fold is length-preserving, and the clamps below
    // keep the slice on valid boundaries regardless.
    let index = index.min(body.len());
    let start = floor_char_boundary(body, index.saturating_sub(radius));
    let end = floor_char_boundary(body, (index + needle.len() + radius).min(body.len()));

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(&body[start..end]);
    if end < body.len() {
        snippet.push_str("...");
    }
    snippet
}

/// Largest byte index `<= index` that sits on a char boundary of `s`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
