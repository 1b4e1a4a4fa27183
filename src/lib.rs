//! manual-mcp: MCP server exposing a markdown article corpus.
//!
//! This library serves a directory of markdown articles (Hugo-style YAML
//! front-matter) to AI assistants over the Model Context Protocol: list
//! articles, fetch one by title, substring search with snippets, and force
//! a corpus reload.
//!
//! # Architecture
//!
//! Bytes flow one way:
//!
//! transport framing → JSON-RPC decode → dispatcher → corpus store /
//! search → JSON-RPC encode → transport.
//!
//! The corpus is loaded lazily on the first real request and replaced
//! wholesale on reload; a failed load always keeps the previous collection
//! and never takes the process down.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`corpus`] — Article model, markdown source, in-memory store
//! - [`error`] — Error types
//! - [`mcp`] — Protocol types, dispatcher, and both transports
//! - [`search`] — Substring search and snippet extraction

pub mod config;
pub mod corpus;
pub mod error;
pub mod mcp;
pub mod search;
