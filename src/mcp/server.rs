//! MCP server: JSON-RPC dispatch over stdio or HTTP

use serde_json::{json, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, error, info, warn};

use super::protocol::{
    methods, CallToolParams, CancelledParams, McpError, McpRequest, McpResponse, McpToolResult,
    RequestId, PROTOCOL_VERSION,
};
use crate::error::{Error, Result};
use crate::tools::{ToolCall, ToolRegistry};

/// Serves a tool registry to MCP clients.
///
/// Requests are handled concurrently; each in-flight request can be
/// cancelled by id through `notifications/cancelled`.
pub struct McpServer {
    name: String,
    version: String,
    tools: ToolRegistry,
    initialized: AtomicBool,
    next_seq: AtomicU64,
    pending: RwLock<HashMap<RequestId, PendingRequest>>,
}

/// An in-flight request; `seq` tells apart reuses of the same id
struct PendingRequest {
    seq: u64,
    cancel: oneshot::Sender<()>,
}

impl McpServer {
    pub fn new(tools: ToolRegistry) -> Self {
        McpServer {
            name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
            tools,
            initialized: AtomicBool::new(false),
            next_seq: AtomicU64::new(0),
            pending: RwLock::new(HashMap::new()),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Whether the client has sent `notifications/initialized`
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Number of requests currently in flight
    pub async fn in_flight(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Handle a request to completion
    pub async fn handle_request(&self, request: McpRequest) -> McpResponse {
        debug!(method = %request.method, "Handling request");

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.params),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => self.handle_list_tools(),
            methods::TOOLS_CALL => self.handle_call_tool(request.params).await,
            _ => Err(McpError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => McpResponse::success(request.id, value),
            Err(error) => McpResponse::error(request.id, error),
        }
    }

    /// Handle a notification; never produces a response
    pub async fn handle_notification(&self, notification: McpRequest) {
        match notification.method.as_str() {
            methods::INITIALIZED => {
                self.initialized.store(true, Ordering::SeqCst);
                info!("Client initialized");
            }
            methods::CANCELLED => {
                let params = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                match params {
                    Some(params) => self.cancel(&params.request_id, params.reason).await,
                    None => warn!("Malformed cancellation notification"),
                }
            }
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> std::result::Result<Value, McpError> {
        let client = params
            .as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("unknown");
        info!(client, "Client connected");

        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.name, "version": self.version }
        }))
    }

    fn handle_list_tools(&self) -> std::result::Result<Value, McpError> {
        Ok(json!({ "tools": self.tools.definitions() }))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> std::result::Result<Value, McpError> {
        let params: CallToolParams = params
            .ok_or_else(|| McpError::invalid_params("Missing params"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| McpError::invalid_params(format!("Invalid params: {}", e)))
            })?;

        let call = ToolCall::new(params.name, params.arguments.unwrap_or_else(|| json!({})));
        let result = McpToolResult::from(self.tools.execute(&call).await);
        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }

    async fn cancel(&self, id: &RequestId, reason: Option<String>) {
        match self.pending.write().await.remove(id) {
            Some(pending) => {
                let _ = pending.cancel.send(());
                info!(request_id = %id, reason = reason.as_deref().unwrap_or(""), "Request cancelled");
            }
            None => debug!(request_id = %id, "Cancellation for unknown or finished request"),
        }
    }

    /// Run one request with cancellation and panic isolation.
    ///
    /// Returns `None` when the request was cancelled; no response is sent
    /// for cancelled requests. An id that is already in flight is rejected
    /// with `invalid_request` and leaves the running request untouched.
    pub async fn process_request(self: &Arc<Self>, request: McpRequest) -> Option<McpResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(request).await;
            return None;
        };

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        match self.pending.write().await.entry(id.clone()) {
            Entry::Occupied(_) => {
                warn!(request_id = %id, "Rejecting request with an id already in flight");
                return Some(McpResponse::error(
                    Some(id.clone()),
                    McpError::invalid_request(format!("Request id {} is already in flight", id)),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingRequest {
                    seq,
                    cancel: cancel_tx,
                });
            }
        }

        let server = self.clone();
        let mut work = tokio::spawn(async move { server.handle_request(request).await });

        let response = tokio::select! {
            joined = &mut work => Some(match joined {
                Ok(response) => response,
                Err(e) => {
                    error!(request_id = %id, "Request handler failed: {}", e);
                    McpResponse::error(Some(id.clone()), McpError::internal_error("Request handler failed"))
                }
            }),
            Ok(()) = cancel_rx => {
                work.abort();
                None
            }
        };

        let mut pending = self.pending.write().await;
        if pending.get(&id).is_some_and(|p| p.seq == seq) {
            pending.remove(&id);
        }
        response
    }

    /// Parse and process one raw message
    pub async fn process_message(self: &Arc<Self>, raw: &str) -> Option<McpResponse> {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable JSON-RPC message: {}", e);
                return Some(McpResponse::error(None, McpError::parse_error("Invalid JSON")));
            }
        };
        match parse_request(value) {
            Ok(request) => self.process_request(request).await,
            Err(response) => Some(response),
        }
    }

    /// Serve newline-delimited JSON-RPC until the reader reaches EOF.
    ///
    /// Each request runs on its own task; responses are written by a single
    /// writer task in completion order.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<McpResponse>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(response) = out_rx.recv().await {
                let mut line = serde_json::to_vec(&response)?;
                line.push(b'\n');
                writer.write_all(&line).await?;
                writer.flush().await?;
            }
            Ok::<(), Error>(())
        });

        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }

            let server = self.clone();
            let out_tx = out_tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.process_message(&line).await {
                    if out_tx.send(response).is_err() {
                        warn!("Response dropped, writer closed");
                    }
                }
            });
        }

        debug!("Input closed, draining in-flight requests");
        drop(out_tx);
        writer_task
            .await
            .map_err(|e| Error::Internal(format!("Writer task failed: {}", e)))?
    }

    /// Serve over standard input/output
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        info!(server = %self.name, "Starting MCP server with stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
        info!("MCP server stopped");
        Ok(())
    }

    /// Axum router for the HTTP transport
    pub fn router(self: Arc<Self>) -> axum::Router {
        use axum::routing::{get, post};
        use tower_http::cors::CorsLayer;

        axum::Router::new()
            .route("/", post(http::handle_json_rpc))
            .route("/mcp", post(http::handle_json_rpc))
            .route("/health", get(http::handle_health))
            .layer(CorsLayer::permissive())
            .with_state(self)
    }

    /// Serve JSON-RPC over HTTP POST until `shutdown` resolves
    pub async fn run_http<F>(self: Arc<Self>, addr: SocketAddr, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(server = %self.name, %addr, "Starting MCP server with HTTP transport");
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("MCP server stopped");
        Ok(())
    }
}

/// Shape-check a parsed message; a bad shape answers `invalid_request`
/// echoing the id when one can be recovered
fn parse_request(value: Value) -> std::result::Result<McpRequest, McpResponse> {
    if value.is_array() {
        return Err(McpResponse::error(
            None,
            McpError::invalid_request("Batch requests are not supported"),
        ));
    }

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
    serde_json::from_value(value).map_err(|e| {
        warn!("Malformed JSON-RPC request: {}", e);
        McpResponse::error(id, McpError::invalid_request(format!("Invalid request: {}", e)))
    })
}

mod http {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use serde_json::{json, Value};
    use std::sync::Arc;

    use super::{parse_request, McpServer};

    pub(super) async fn handle_json_rpc(
        State(server): State<Arc<McpServer>>,
        Json(body): Json<Value>,
    ) -> Response {
        let request = match parse_request(body) {
            Ok(request) => request,
            Err(response) => return (StatusCode::OK, Json(response)).into_response(),
        };

        match server.process_request(request).await {
            Some(response) => (StatusCode::OK, Json(response)).into_response(),
            None => StatusCode::ACCEPTED.into_response(),
        }
    }

    pub(super) async fn handle_health(State(server): State<Arc<McpServer>>) -> Json<Value> {
        Json(json!({
            "status": "ok",
            "tools": server.tools().count(),
        }))
    }
}
