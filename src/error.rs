//! Error types for manual-mcp.
//!
//! Two families: [`ConfigError`] for startup configuration problems, and
//! [`CorpusError`] for failures while enumerating or reading the article
//! corpus. Corpus failures are never fatal to the server; the dispatcher
//! converts them into JSON-RPC error responses and keeps serving.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found at an explicitly requested path.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors that can occur while loading the article corpus.
///
/// Any of these surfaces to the client as a "source unavailable" server
/// error; the store keeps its previous collection on failure.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// The glob pattern over the content base was invalid.
    #[error("invalid corpus glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Enumerating the content base failed.
    #[error("failed to enumerate corpus: {0}")]
    Walk(#[from] glob::GlobError),

    /// An article file could not be read.
    #[error("failed to read article file: {path}")]
    ReadError {
        /// Path to the article file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
