//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the MCP surface for exposing the article corpus
//! as tools to AI assistants, as JSON-RPC 2.0 over two transports.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         MCP Server                           │
//! │                                                              │
//! │   ┌──────────────┐    ┌──────────────┐    ┌──────────────┐   │
//! │   │  Transport   │───▶│  Dispatcher  │───▶│ Store/Search │   │
//! │   │ (stdio/http) │    │ (handshake + │    │   (corpus)   │   │
//! │   └──────────────┘    │   tools)     │    └──────────────┘   │
//! │          │            └──────────────┘                       │
//! │          ▼                    ▼                              │
//! │   ┌──────────────────────────────────────────────────┐       │
//! │   │              JSON-RPC 2.0 Messages               │       │
//! │   └──────────────────────────────────────────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stream transport frames messages as newline-delimited JSON on
//! stdio; the HTTP transport multiplexes many sessions over `POST /mcp`,
//! keyed by the `Mcp-Session-Id` header. Both feed the same dispatcher.
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod http;
pub mod protocol;
pub mod server;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::Dispatcher;
pub use transport::{StdioServer, StdioTransport};
