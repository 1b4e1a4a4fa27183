//! MCP request dispatch for the manual corpus.
//!
//! The [`Dispatcher`] decodes one request, runs the handshake/tool state
//! machine, and encodes one response. It owns the tool registry and routes
//! `tools/call` to the document store and search engine. It is
//! transport-independent: the stdio loop feeds it lines, the HTTP layer
//! feeds it decoded JSON values, one dispatcher per session.
//!
//! # Lifecycle
//!
//! 1. **Handshake**: `initialize` / `initialized` exchange
//! 2. **Operation**: `tools/list` and `tools/call`
//!
//! The handshake is advisory bookkeeping: tool calls arriving before
//! `initialized` are served, not rejected, matching the permissive clients
//! of this protocol family. Before dispatching any method except
//! `initialize` the corpus is lazily loaded, so the first real request
//! pays the load cost.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::corpus::{ArticleMeta, DocumentStore};
use crate::mcp::protocol::{
    parse_message, parse_value, IncomingMessage, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::search::{self, SearchField};

/// Handshake state of one dispatcher.
///
/// Advisory only: `Ready` is recorded when the client completes the
/// handshake, but no method is gated on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No `initialize` seen yet.
    Uninitialized,
    /// Handshake completed (or at least started).
    Ready,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities. The tool list is static, so this is empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {}

/// Server information for the initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request. All fields are optional; the
/// request is accepted even without params.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by the client.
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// A tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Parameters for the tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// Arguments for `getArticle`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GetArticleArgs {
    title: String,
}

/// Arguments for `searchArticles`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchArticlesArgs {
    q: String,
    #[serde(default)]
    fields: Option<Vec<SearchField>>,
}

/// Payload of a successful `getArticle`.
#[derive(Debug, Serialize)]
struct ArticlePayload {
    metadata: ArticleMeta,
    body: String,
}

/// Payload of a successful `reload`.
#[derive(Debug, Serialize)]
struct ReloadPayload {
    reloaded: bool,
    count: usize,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call: MCP text content carrying the JSON-serialised
/// typed payload.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Wraps a serialisable payload as text content.
    fn from_payload<T: Serialize>(payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            content: vec![ToolContent::Text {
                text: serde_json::to_string(payload)?,
            }],
        })
    }
}

/// The per-session protocol dispatcher.
pub struct Dispatcher {
    state: HandshakeState,
    store: Arc<DocumentStore>,
}

impl Dispatcher {
    /// Creates a dispatcher over the (possibly shared) document store.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            state: HandshakeState::Uninitialized,
            store,
        }
    }

    /// Returns the current handshake state.
    #[must_use]
    pub const fn state(&self) -> HandshakeState {
        self.state
    }

    /// Handles one line of the stream transport.
    ///
    /// Returns the serialised response to write back, or `None` for blank
    /// lines and notifications. A decode failure yields a parse-error
    /// response with a `null` id; the stream continues afterwards.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        match parse_message(line) {
            Ok(msg) => self.dispatch(msg).map(|v| encode(&v)),
            Err(error) => Some(encode_error(&error)),
        }
    }

    /// Handles one decoded message from the session transport.
    ///
    /// Returns the response as a JSON value, or `None` for notifications.
    pub fn handle_value(&mut self, value: Value) -> Option<Value> {
        match parse_value(value) {
            Ok(msg) => self.dispatch(msg),
            Err(error) => Some(error_value(&error)),
        }
    }

    fn dispatch(&mut self, msg: IncomingMessage) -> Option<Value> {
        match msg {
            IncomingMessage::Request(req) => {
                tracing::debug!(method = %req.method, id = %req.id, "Request");
                let value = match self.handle_request(req) {
                    Ok(resp) => response_value(&resp),
                    Err(error) => error_value(&error),
                };
                Some(value)
            }
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif);
                None
            }
        }
    }

    /// Handles an incoming request, producing exactly one response.
    ///
    /// # Errors
    ///
    /// Returns the JSON-RPC error response to send; no failure here is
    /// fatal to the process.
    pub fn handle_request(&mut self, req: JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        // Lazy-load the corpus for everything but initialize: the first
        // real request pays the load cost.
        if req.method != "initialize" {
            if let Err(e) = self.store.ensure_loaded() {
                tracing::error!(error = %e, "Lazy corpus load failed");
                return Err(JsonRpcError::server_error(
                    Some(req.id),
                    format!("Corpus unavailable: {e}"),
                ));
            }
        }

        match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "initialized" | "notifications/initialized" => Ok(self.handle_initialized(&req)),
            "tools/list" => Ok(Self::handle_tools_list(&req)),
            "tools/call" => self.handle_tools_call(&req),
            "ping" => Ok(JsonRpcResponse::success(req.id.clone(), json!({}))),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    /// Handles an incoming notification. Produces no output.
    pub fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "initialized" | "notifications/initialized" => {
                self.state = HandshakeState::Ready;
            }
            other => {
                tracing::debug!(method = other, "Ignoring notification");
            }
        }
    }

    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        let params: InitializeParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(req.id.clone(), format!("Invalid initialize params: {e}"))
            })?
            .unwrap_or_default();

        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                version = client.version.as_deref().unwrap_or("?"),
                "Client connected"
            );
        }

        self.state = HandshakeState::Ready;

        let result = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// `initialized` sent as a request gets a plain acknowledgement.
    fn handle_initialized(&mut self, req: &JsonRpcRequest) -> JsonRpcResponse {
        self.state = HandshakeState::Ready;
        JsonRpcResponse::success(req.id.clone(), json!({ "acknowledged": true }))
    }

    fn handle_tools_list(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({ "tools": tool_definitions() }))
    }

    fn handle_tools_call(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        let params: ToolCallParams = req
            .params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| {
                JsonRpcError::invalid_params(req.id.clone(), format!("Invalid tool call params: {e}"))
            })?
            .ok_or_else(|| JsonRpcError::invalid_params(req.id.clone(), "Missing tool call params"))?;

        tracing::debug!(tool = %params.name, "tools/call");

        let result = match params.name.as_str() {
            "listArticles" => self.tool_list_articles(&req.id),
            "getArticle" => self.tool_get_article(&req.id, params.arguments),
            "searchArticles" => self.tool_search_articles(&req.id, params.arguments),
            "reload" => self.tool_reload(&req.id),
            _ => Err(JsonRpcError::unknown_tool(req.id.clone(), &params.name)),
        }?;

        let value = serde_json::to_value(&result)
            .map_err(|e| serialise_failure(req.id.clone(), &e))?;

        Ok(JsonRpcResponse::success(req.id.clone(), value))
    }

    fn tool_list_articles(&self, id: &RequestId) -> Result<ToolCallResult, JsonRpcError> {
        let rows = self.store.list_all();
        ToolCallResult::from_payload(&rows).map_err(|e| serialise_failure(id.clone(), &e))
    }

    fn tool_get_article(&self, id: &RequestId, args: Value) -> Result<ToolCallResult, JsonRpcError> {
        let args: GetArticleArgs = parse_args(id, args)?;
        if args.title.trim().is_empty() {
            return Err(JsonRpcError::invalid_params(id.clone(), "title required"));
        }

        let article = self.store.find_by_title(&args.title).ok_or_else(|| {
            JsonRpcError::server_error(Some(id.clone()), format!("not found: {}", args.title))
        })?;

        let payload = ArticlePayload {
            metadata: article.meta,
            body: article.body,
        };
        ToolCallResult::from_payload(&payload).map_err(|e| serialise_failure(id.clone(), &e))
    }

    fn tool_search_articles(
        &self,
        id: &RequestId,
        args: Value,
    ) -> Result<ToolCallResult, JsonRpcError> {
        let args: SearchArticlesArgs = parse_args(id, args)?;
        let fields = args.fields.unwrap_or_else(|| SearchField::ALL.to_vec());

        // An empty query is not an error; it just matches nothing.
        let snapshot = self.store.snapshot();
        let results = search::search(&snapshot, args.q.trim(), &fields);

        ToolCallResult::from_payload(&results).map_err(|e| serialise_failure(id.clone(), &e))
    }

    fn tool_reload(&self, id: &RequestId) -> Result<ToolCallResult, JsonRpcError> {
        let count = self.store.reload().map_err(|e| {
            tracing::error!(error = %e, "Reload failed");
            JsonRpcError::server_error(Some(id.clone()), format!("Reload failed: {e}"))
        })?;

        let payload = ReloadPayload {
            reloaded: true,
            count,
        };
        ToolCallResult::from_payload(&payload).map_err(|e| serialise_failure(id.clone(), &e))
    }
}

/// Deserialises tool arguments, failing closed with `InvalidParams` before
/// any business logic runs.
fn parse_args<T: serde::de::DeserializeOwned>(
    id: &RequestId,
    args: Value,
) -> Result<T, JsonRpcError> {
    serde_json::from_value(args)
        .map_err(|e| JsonRpcError::invalid_params(id.clone(), format!("Invalid arguments: {e}")))
}

fn serialise_failure(id: RequestId, error: &serde_json::Error) -> JsonRpcError {
    tracing::error!(error = %error, "Failed to serialise tool result");
    JsonRpcError::internal_error(id, "Internal error: failed to serialise result")
}

/// The four static tool descriptors.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "listArticles".to_string(),
            description: "List articles (title, tags, date, lastmod).".to_string(),
            input_schema: json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {}
            }),
        },
        ToolDefinition {
            name: "getArticle".to_string(),
            description: "Get an article by title.".to_string(),
            input_schema: json!({
                "type": "object",
                "additionalProperties": false,
                "required": ["title"],
                "properties": {
                    "title": { "type": "string" }
                }
            }),
        },
        ToolDefinition {
            name: "searchArticles".to_string(),
            description: "Search articles by query string (title, tags, content).".to_string(),
            input_schema: json!({
                "type": "object",
                "additionalProperties": false,
                "required": ["q"],
                "properties": {
                    "q": { "type": "string" },
                    "fields": {
                        "type": "array",
                        "items": { "type": "string", "enum": ["title", "tags", "content"] }
                    }
                }
            }),
        },
        ToolDefinition {
            name: "reload".to_string(),
            description: "Reload all articles from the source.".to_string(),
            input_schema: json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {}
            }),
        },
    ]
}

fn response_value(resp: &JsonRpcResponse) -> Value {
    serde_json::to_value(resp).unwrap_or_else(|e| fallback_internal_error(&e))
}

fn error_value(error: &JsonRpcError) -> Value {
    serde_json::to_value(error).unwrap_or_else(|e| fallback_internal_error(&e))
}

fn encode(value: &Value) -> String {
    value.to_string()
}

fn encode_error(error: &JsonRpcError) -> String {
    error_value(error).to_string()
}

// Serialising our own response types cannot realistically fail; if it ever
// does, answer with a minimal internal error rather than dropping the
// response.
fn fallback_internal_error(error: &serde_json::Error) -> Value {
    tracing::error!(error = %error, "Failed to serialise response");
    json!({
        "jsonrpc": "2.0",
        "id": null,
        "error": { "code": -32603, "message": "Internal error" }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Article, DocumentSource};
    use crate::error::CorpusError;

    struct FixtureSource;

    impl DocumentSource for FixtureSource {
        fn load_all(&self) -> Result<Vec<Article>, CorpusError> {
            Ok(vec![
                Article {
                    meta: ArticleMeta {
                        title: "A".to_string(),
                        author: None,
                        date: Some("2024-01-01".to_string()),
                        lastmod: None,
                        tags: vec!["x".to_string()],
                    },
                    body: "hello world".to_string(),
                },
                Article {
                    meta: ArticleMeta {
                        title: "Vim Tricks".to_string(),
                        author: Some("mika".to_string()),
                        date: None,
                        lastmod: Some("2024-02-02".to_string()),
                        tags: vec!["vim".to_string(), "editor".to_string()],
                    },
                    body: "modal editing all the way down".to_string(),
                },
            ])
        }
    }

    struct BrokenSource;

    impl DocumentSource for BrokenSource {
        fn load_all(&self) -> Result<Vec<Article>, CorpusError> {
            Err(CorpusError::ReadError {
                path: "/broken".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "nope"),
            })
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(DocumentStore::new(Box::new(FixtureSource))))
    }

    fn call(d: &mut Dispatcher, line: &str) -> Value {
        let out = d.handle_line(line).expect("expected a response");
        serde_json::from_str(&out).unwrap()
    }

    /// Unwraps the JSON text payload of a tools/call response.
    fn tool_text(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn initialize_reports_server_info() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","clientInfo":{"name":"t"}}}"#,
        );
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["serverInfo"]["name"], "manual-mcp");
        assert_eq!(resp["result"]["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(d.state(), HandshakeState::Ready);
    }

    #[test]
    fn initialize_without_params_is_accepted() {
        let mut d = dispatcher();
        let resp = call(&mut d, r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#);
        assert!(resp.get("result").is_some());
    }

    #[test]
    fn initialized_request_is_acknowledged() {
        let mut d = dispatcher();
        let resp = call(&mut d, r#"{"jsonrpc":"2.0","id":2,"method":"initialized"}"#);
        assert_eq!(resp["result"]["acknowledged"], true);
    }

    #[test]
    fn initialized_notification_produces_no_output() {
        let mut d = dispatcher();
        let out = d.handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
        assert!(out.is_none());
        assert_eq!(d.state(), HandshakeState::Ready);
    }

    #[test]
    fn tools_list_has_four_tools() {
        let mut d = dispatcher();
        let resp = call(&mut d, r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#);
        let tools = resp["result"]["tools"].as_array().unwrap();
        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["listArticles", "getArticle", "searchArticles", "reload"]
        );
    }

    #[test]
    fn tool_calls_work_without_handshake() {
        // Leniency: no initialize was ever sent.
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"listArticles"}}"#,
        );
        let rows = tool_text(&resp);
        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[0]["title"], "A");
    }

    #[test]
    fn get_article_returns_metadata_and_body() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"getArticle","arguments":{"title":"Vim Tricks"}}}"#,
        );
        let payload = tool_text(&resp);
        assert_eq!(payload["metadata"]["title"], "Vim Tricks");
        assert_eq!(payload["body"], "modal editing all the way down");
    }

    #[test]
    fn get_article_unknown_title_is_server_error() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"getArticle","arguments":{"title":"missing"}}}"#,
        );
        assert_eq!(resp["error"]["code"], -32000);
        assert!(resp["error"]["message"].as_str().unwrap().contains("not found"));
    }

    #[test]
    fn get_article_missing_title_is_invalid_params() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"getArticle","arguments":{}}}"#,
        );
        assert_eq!(resp["error"]["code"], -32602);
    }

    #[test]
    fn get_article_blank_title_is_invalid_params() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"getArticle","arguments":{"title":"  "}}}"#,
        );
        assert_eq!(resp["error"]["code"], -32602);
    }

    #[test]
    fn search_articles_end_to_end() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"searchArticles","arguments":{"q":"hello"}}}"#,
        );
        let results = tool_text(&resp);
        assert_eq!(results.as_array().unwrap().len(), 1);
        assert_eq!(results[0]["title"], "A");
        assert!(results[0]["snippet"].as_str().unwrap().contains("hello world"));
    }

    #[test]
    fn search_articles_empty_query_is_empty_result() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"searchArticles","arguments":{"q":"  "}}}"#,
        );
        assert_eq!(tool_text(&resp).as_array().unwrap().len(), 0);
    }

    #[test]
    fn search_articles_missing_q_is_invalid_params() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":10,"method":"tools/call","params":{"name":"searchArticles","arguments":{}}}"#,
        );
        assert_eq!(resp["error"]["code"], -32602);
    }

    #[test]
    fn search_articles_respects_field_selection() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":11,"method":"tools/call","params":{"name":"searchArticles","arguments":{"q":"vim","fields":["content"]}}}"#,
        );
        // "vim" appears in title and tags of the fixture, not in any body.
        assert_eq!(tool_text(&resp).as_array().unwrap().len(), 0);
    }

    #[test]
    fn reload_reports_count() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":12,"method":"tools/call","params":{"name":"reload"}}"#,
        );
        let payload = tool_text(&resp);
        assert_eq!(payload["reloaded"], true);
        assert_eq!(payload["count"], 2);
    }

    #[test]
    fn unknown_tool_is_method_not_found() {
        let mut d = dispatcher();
        let resp = call(
            &mut d,
            r#"{"jsonrpc":"2.0","id":13,"method":"tools/call","params":{"name":"dropTables"}}"#,
        );
        assert_eq!(resp["error"]["code"], -32601);
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let mut d = dispatcher();
        let resp = call(&mut d, r#"{"jsonrpc":"2.0","id":14,"method":"frobnicate"}"#);
        assert_eq!(resp["error"]["code"], -32601);
    }

    #[test]
    fn malformed_line_then_recovery() {
        let mut d = dispatcher();

        let bad = d.handle_line("this is not json {").expect("parse error response");
        let bad: Value = serde_json::from_str(&bad).unwrap();
        assert_eq!(bad["error"]["code"], -32700);
        assert!(bad["id"].is_null());

        // The stream continues: the next well-formed line still succeeds.
        let resp = call(&mut d, r#"{"jsonrpc":"2.0","id":15,"method":"tools/list"}"#);
        assert!(resp.get("result").is_some());
    }

    #[test]
    fn blank_line_is_ignored() {
        let mut d = dispatcher();
        assert!(d.handle_line("   ").is_none());
        assert!(d.handle_line("").is_none());
    }

    #[test]
    fn broken_source_is_recovered_error_not_crash() {
        let mut d = Dispatcher::new(Arc::new(DocumentStore::new(Box::new(BrokenSource))));
        let resp = call(&mut d, r#"{"jsonrpc":"2.0","id":16,"method":"tools/list"}"#);
        assert_eq!(resp["error"]["code"], -32000);

        // The process is still serving; initialize does not touch the store.
        let resp = call(&mut d, r#"{"jsonrpc":"2.0","id":17,"method":"initialize"}"#);
        assert!(resp.get("result").is_some());
    }

    #[test]
    fn every_request_with_id_gets_exactly_one_response() {
        let mut d = dispatcher();
        let lines = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "not json at all",
            r#"{"jsonrpc":"2.0","id":3,"method":"nope"}"#,
        ];
        let responses: Vec<_> = lines.iter().filter_map(|l| d.handle_line(l)).collect();
        // 3 id'd requests + 1 parse error, 0 for the notification.
        assert_eq!(responses.len(), 4);
    }
}
