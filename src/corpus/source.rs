//! Corpus sources: where articles come from.
//!
//! The store is generic over [`DocumentSource`] so tests can feed it
//! in-memory fixtures; production uses [`MarkdownSource`], which walks a
//! content directory for `*.md` files with optional YAML front-matter.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::corpus::{Article, ArticleMeta};
use crate::error::CorpusError;

/// Produces the full corpus on demand.
///
/// `load_all` is called once lazily and again on every explicit reload; a
/// failing call must leave no partial state behind (the store discards the
/// result wholesale on error).
pub trait DocumentSource: Send + Sync {
    /// Loads every article from the source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be enumerated or read.
    fn load_all(&self) -> Result<Vec<Article>, CorpusError>;
}

/// A corpus of markdown files under a content directory.
///
/// Files are matched with `**/*.md` (dot-files excluded) and read in sorted
/// path order, so load order is stable across reloads. Each file may start
/// with a `---`-delimited YAML front-matter block; a file whose front-matter
/// fails to parse is skipped with a warning rather than failing the load.
pub struct MarkdownSource {
    base: PathBuf,
}

impl MarkdownSource {
    /// Creates a source rooted at the given content directory.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// The content directory this source reads from.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl DocumentSource for MarkdownSource {
    fn load_all(&self) -> Result<Vec<Article>, CorpusError> {
        let pattern = self.base.join("**/*.md");
        let options = glob::MatchOptions {
            require_literal_leading_dot: true,
            ..glob::MatchOptions::default()
        };

        let mut paths = Vec::new();
        for entry in glob::glob_with(&pattern.to_string_lossy(), options)? {
            paths.push(entry?);
        }
        paths.sort();

        let mut articles = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = std::fs::read_to_string(&path).map_err(|e| CorpusError::ReadError {
                path: path.clone(),
                source: e,
            })?;

            match parse_article(&path, &raw) {
                Some(article) => articles.push(article),
                None => {
                    tracing::warn!(path = %path.display(), "Skipping article with malformed front-matter");
                }
            }
        }

        Ok(articles)
    }
}

/// Raw front-matter as declared in the file. Unknown keys are ignored;
/// scalar fields tolerate non-string YAML scalars (dates, numbers).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    title: Option<String>,
    author: Option<String>,
    date: Option<serde_yaml::Value>,
    lastmod: Option<serde_yaml::Value>,
    tags: Option<serde_yaml::Value>,
}

/// Parses one markdown file into an [`Article`].
///
/// Returns `None` when the front-matter block is present but malformed.
fn parse_article(path: &Path, raw: &str) -> Option<Article> {
    let (front, body) = split_front_matter(raw);

    let fm = match front {
        Some(block) if block.trim().is_empty() => FrontMatter::default(),
        Some(block) => serde_yaml::from_str(block).ok()?,
        None => FrontMatter::default(),
    };

    let title = fm
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| file_stem(path));

    Some(Article {
        meta: ArticleMeta {
            title,
            author: fm.author,
            date: fm.date.as_ref().and_then(scalar_to_string),
            lastmod: fm.lastmod.as_ref().and_then(scalar_to_string),
            tags: yaml_tags(fm.tags.as_ref()),
        },
        body: body.to_string(),
    })
}

/// Derives the default title from the file name, without the `.md` suffix.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Tags are kept only when declared as a sequence, matching the site
/// generator's handling; a scalar `tags:` value is treated as absent.
fn yaml_tags(value: Option<&serde_yaml::Value>) -> Vec<String> {
    match value {
        Some(serde_yaml::Value::Sequence(items)) => {
            items.iter().filter_map(scalar_to_string).collect()
        }
        _ => Vec::new(),
    }
}

/// Splits an optional leading `---` front-matter block from the body.
///
/// Returns `(front_matter, body)`; `front_matter` is `None` when the file
/// does not open with a delimiter, in which case the body is the whole file.
fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let Some(after_open) = raw.strip_prefix("---") else {
        return (None, raw);
    };
    let Some(after_open) = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))
    else {
        return (None, raw);
    };

    // Closing delimiter immediately after the opening one: empty block.
    if let Some(rest) = after_open.strip_prefix("---") {
        if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
            return (Some(""), strip_leading_newline(rest));
        }
    }

    let mut search_from = 0;
    while let Some(pos) = after_open[search_from..].find("\n---") {
        let close = search_from + pos;
        let tail = &after_open[close + 4..];
        if tail.is_empty() || tail.starts_with('\n') || tail.starts_with("\r\n") {
            return (Some(&after_open[..close]), strip_leading_newline(tail));
        }
        search_from = close + 4;
    }

    (None, raw)
}

fn strip_leading_newline(s: &str) -> &str {
    s.strip_prefix("\r\n")
        .or_else(|| s.strip_prefix('\n'))
        .unwrap_or(s)
}
