//! Streamable HTTP transport: session-multiplexed MCP over axum.
//!
//! - `POST /mcp` — one JSON-RPC message per request body. An `initialize`
//!   request without a session creates one; the fresh session id is returned
//!   in the `Mcp-Session-Id` response header and routes every later request
//!   to that session's dispatcher.
//! - `DELETE /mcp` — explicit session teardown.
//! - `GET /health` — fixed `OK`, independent of corpus state.
//!
//! Each session has its own dispatcher (own handshake state); all sessions
//! share the single process-wide [`DocumentStore`]. Sessions have no expiry:
//! a leaked session lives until DELETE or process restart.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use crate::corpus::DocumentStore;
use crate::mcp::protocol::{JsonRpcError, RequestId};
use crate::mcp::server::Dispatcher;

/// Header carrying the session id on every non-initial request.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Process-wide mapping from session id to per-session dispatcher.
///
/// Entries are created by `initialize` and removed only by explicit
/// teardown; there is no background expiry sweep.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Dispatcher>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session around the given dispatcher, returning the
    /// fresh opaque session id.
    pub fn insert(&self, dispatcher: Dispatcher) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock().insert(id.clone(), dispatcher);
        tracing::info!(session = %id, "Session created");
        id
    }

    /// Runs `f` against the session's dispatcher, if the session exists.
    pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut Dispatcher) -> T) -> Option<T> {
        self.lock().get_mut(id).map(f)
    }

    /// Removes a session. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        let existed = self.lock().remove(id).is_some();
        if existed {
            tracing::info!(session = %id, "Session closed");
        }
        existed
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Dispatcher>> {
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Shared state of the HTTP transport.
#[derive(Clone)]
pub struct HttpState {
    /// The process-wide document store, shared by every session.
    pub store: Arc<DocumentStore>,
    /// Live sessions.
    pub sessions: Arc<SessionRegistry>,
}

impl HttpState {
    /// Creates transport state over the shared store.
    #[must_use]
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            store,
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

/// Builds the MCP HTTP router.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/mcp", post(handle_post).delete(handle_delete))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Binds the listener and serves the router until the process exits.
///
/// # Errors
///
/// Returns an error if binding or serving fails.
pub async fn serve(state: HttpState, addr: &str) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP transport listening");
    axum::serve(listener, router(state)).await
}

/// Liveness probe: fixed OK, independent of corpus state.
async fn handle_health() -> &'static str {
    "OK"
}

async fn handle_post(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Ok(message) = serde_json::from_str::<Value>(&body) else {
        return (StatusCode::BAD_REQUEST, Json(JsonRpcError::parse_error())).into_response();
    };

    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    // Known session: route to its dispatcher.
    if let Some(sid) = &session_id {
        if let Some(reply) = state
            .sessions
            .with_session(sid, |dispatcher| dispatcher.handle_value(message.clone()))
        {
            return reply_response(reply);
        }
    }

    // No (known) session: only initialize may proceed, creating one.
    if is_initialize(&message) {
        let mut dispatcher = Dispatcher::new(Arc::clone(&state.store));
        let reply = dispatcher.handle_value(message);
        let sid = state.sessions.insert(dispatcher);

        let mut response = reply_response(reply);
        if let Ok(value) = HeaderValue::from_str(&sid) {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
        return response;
    }

    tracing::warn!(session = session_id.as_deref().unwrap_or("<none>"), "Rejected sessionless request");
    let error = JsonRpcError::server_error(
        message_id(&message),
        "Invalid or missing session id; send initialize first",
    );
    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}

async fn handle_delete(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let session_id = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());

    match session_id {
        Some(sid) if state.sessions.remove(sid) => StatusCode::NO_CONTENT.into_response(),
        _ => (StatusCode::BAD_REQUEST, "Invalid or missing session id").into_response(),
    }
}

/// Requests get their JSON-RPC reply; notifications get 202 and no body.
fn reply_response(reply: Option<Value>) -> Response {
    reply.map_or_else(
        || StatusCode::ACCEPTED.into_response(),
        |value| Json(value).into_response(),
    )
}

fn is_initialize(message: &Value) -> bool {
    message.get("method").and_then(Value::as_str) == Some("initialize")
        && message.get("id").is_some()
}

/// Best-effort id echo for the session-required error.
fn message_id(message: &Value) -> Option<RequestId> {
    message
        .get("id")
        .cloned()
        .and_then(|id| serde_json::from_value(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Article, ArticleMeta, DocumentSource};
    use crate::error::CorpusError;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct FixtureSource;

    impl DocumentSource for FixtureSource {
        fn load_all(&self) -> Result<Vec<Article>, CorpusError> {
            Ok(vec![Article {
                meta: ArticleMeta {
                    title: "A".to_string(),
                    author: None,
                    date: None,
                    lastmod: None,
                    tags: vec!["x".to_string()],
                },
                body: "hello world".to_string(),
            }])
        }
    }

    fn test_router() -> Router {
        let store = Arc::new(DocumentStore::new(Box::new(FixtureSource)));
        router(HttpState::new(store))
    }

    fn post_mcp(body: &str, session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json");
        if let Some(sid) = session {
            builder = builder.header(SESSION_HEADER, sid);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok_without_corpus() {
        let app = test_router();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn initialize_creates_session() {
        let app = test_router();
        let response = app
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let sid = response
            .headers()
            .get(SESSION_HEADER)
            .expect("session header")
            .to_str()
            .unwrap()
            .to_string();
        assert!(!sid.is_empty());

        let body = body_json(response).await;
        assert_eq!(body["result"]["serverInfo"]["name"], "manual-mcp");
    }

    #[tokio::test]
    async fn session_routes_tool_calls() {
        let app = test_router();

        let init = app
            .clone()
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                None,
            ))
            .await
            .unwrap();
        let sid = init.headers()[SESSION_HEADER].to_str().unwrap().to_string();

        let response = app
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"listArticles"}}"#,
                Some(&sid),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], 2);
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let rows: Value = serde_json::from_str(text).unwrap();
        assert_eq!(rows[0]["title"], "A");
    }

    #[tokio::test]
    async fn sessionless_non_initialize_is_rejected() {
        let app = test_router();
        let response = app
            .oneshot(post_mcp(r#"{"jsonrpc":"2.0","id":9,"method":"tools/list"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(body["id"], 9);
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let app = test_router();
        let response = app
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#,
                Some("no-such-session"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let app = test_router();
        let response = app.oneshot(post_mcp("{ not json", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());
    }

    #[tokio::test]
    async fn notification_is_accepted_without_body() {
        let app = test_router();

        let init = app
            .clone()
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                None,
            ))
            .await
            .unwrap();
        let sid = init.headers()[SESSION_HEADER].to_str().unwrap().to_string();

        let response = app
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                Some(&sid),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn delete_tears_down_session() {
        let store = Arc::new(DocumentStore::new(Box::new(FixtureSource)));
        let state = HttpState::new(store);
        let app = router(state.clone());

        let init = app
            .clone()
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                None,
            ))
            .await
            .unwrap();
        let sid = init.headers()[SESSION_HEADER].to_str().unwrap().to_string();
        assert_eq!(state.sessions.len(), 1);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/mcp")
                    .header(SESSION_HEADER, &sid)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.sessions.is_empty());

        // The torn-down session no longer routes.
        let response = app
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                Some(&sid),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_without_session_is_rejected() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/mcp")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sessions_have_independent_dispatchers() {
        let app = test_router();

        let first = app
            .clone()
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                None,
            ))
            .await
            .unwrap();
        let second = app
            .clone()
            .oneshot(post_mcp(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                None,
            ))
            .await
            .unwrap();

        let sid_a = first.headers()[SESSION_HEADER].to_str().unwrap().to_string();
        let sid_b = second.headers()[SESSION_HEADER].to_str().unwrap().to_string();
        assert_ne!(sid_a, sid_b);

        // Both route independently to the shared corpus.
        for sid in [&sid_a, &sid_b] {
            let response = app
                .clone()
                .oneshot(post_mcp(
                    r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
                    Some(sid),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
