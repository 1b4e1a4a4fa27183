//! The article corpus: data model, loading, and the in-memory store.
//!
//! An [`Article`] is a parsed markdown file: YAML front-matter metadata plus
//! the body text. Articles are immutable once loaded; the [`DocumentStore`]
//! replaces its whole collection atomically on (re)load, so readers holding
//! an older snapshot stay valid but no longer see it in new enumerations.

pub mod source;
pub mod store;

use serde::{Deserialize, Serialize};

pub use source::{DocumentSource, MarkdownSource};
pub use store::DocumentStore;

/// Front-matter metadata of one article.
///
/// Only `title` is required; it defaults to the file stem when the
/// front-matter omits it. No uniqueness is enforced across the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMeta {
    /// Article title, the lookup key for `getArticle`.
    pub title: String,

    /// Author, if declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Publication date, verbatim from the front-matter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Last modification date, verbatim from the front-matter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,

    /// Tags in declaration order.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One loaded article: metadata plus body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    /// Front-matter metadata.
    pub meta: ArticleMeta,
    /// Body text (everything after the front-matter block).
    pub body: String,
}

/// Listing projection of an article, returned by `listArticles`.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    /// Article title.
    pub title: String,
    /// Tags in declaration order.
    pub tags: Vec<String>,
    /// Publication date, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Last modification date, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            title: article.meta.title.clone(),
            tags: article.meta.tags.clone(),
            date: article.meta.date.clone(),
            lastmod: article.meta.lastmod.clone(),
        }
    }
}
