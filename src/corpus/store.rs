//! The in-memory document store.
//!
//! The store owns the current corpus behind an `RwLock<Arc<Vec<Article>>>`.
//! A (re)load builds the whole new collection first and then swaps the `Arc`
//! under the write lock, so readers observe either the full old or the full
//! new corpus, never a mix. On a failed load the previous collection is kept.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::corpus::source::DocumentSource;
use crate::corpus::{Article, ArticleSummary};
use crate::error::CorpusError;

/// Owns the in-memory article collection and its load lifecycle.
pub struct DocumentStore {
    source: Box<dyn DocumentSource>,
    articles: RwLock<Arc<Vec<Article>>>,
}

impl DocumentStore {
    /// Creates an empty store backed by the given source. Nothing is loaded
    /// until [`load`](Self::load) or [`ensure_loaded`](Self::ensure_loaded)
    /// runs.
    #[must_use]
    pub fn new(source: Box<dyn DocumentSource>) -> Self {
        Self {
            source,
            articles: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Loads the corpus from the source, replacing the collection wholesale.
    ///
    /// Returns the new article count.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails; the store keeps its previous
    /// collection in that case.
    pub fn load(&self) -> Result<usize, CorpusError> {
        let articles = self.source.load_all()?;
        let count = articles.len();
        *self.write_guard() = Arc::new(articles);
        tracing::info!(count, "Corpus loaded");
        Ok(count)
    }

    /// Loads the corpus only when the collection is currently empty.
    ///
    /// Idempotent; never reloads a non-empty collection. This is the lazy
    /// init guard that the dispatcher runs before every method except
    /// `initialize`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lazy load fails.
    pub fn ensure_loaded(&self) -> Result<(), CorpusError> {
        if self.snapshot().is_empty() {
            tracing::debug!("Corpus empty, lazy loading");
            self.load()?;
        }
        Ok(())
    }

    /// Unconditionally reloads the corpus.
    ///
    /// Returns the new article count.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails; the store keeps its previous
    /// collection in that case.
    pub fn reload(&self) -> Result<usize, CorpusError> {
        self.load()
    }

    /// Returns the current collection as a cheap shared snapshot.
    ///
    /// The snapshot stays readable across a later reload but will not
    /// reflect it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Article>> {
        Arc::clone(&self.read_guard())
    }

    /// Returns a listing projection of every article, in load order.
    #[must_use]
    pub fn list_all(&self) -> Vec<ArticleSummary> {
        self.snapshot().iter().map(ArticleSummary::from).collect()
    }

    /// Returns the first article whose title exactly equals `title`.
    ///
    /// Titles are not unique in the source data; when two articles share a
    /// title the later one is unreachable here (though both appear in
    /// [`list_all`](Self::list_all)). First-wins is the documented contract.
    #[must_use]
    pub fn find_by_title(&self, title: &str) -> Option<Article> {
        self.snapshot()
            .iter()
            .find(|a| a.meta.title == title)
            .cloned()
    }

    /// Number of articles currently loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether the collection is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    // Lock poisoning can only happen if a panic occurs mid-swap, and the
    // swap itself cannot panic; recover the guard rather than propagate.
    fn read_guard(&self) -> RwLockReadGuard<'_, Arc<Vec<Article>>> {
        self.articles
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Arc<Vec<Article>>> {
        self.articles
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
