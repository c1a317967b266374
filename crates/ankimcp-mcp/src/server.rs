//! MCP server over stdio.
//!
//! Newline-delimited JSON-RPC: one message per line on stdin, one response
//! per line on stdout. Each request runs on its own task so a slow tool call
//! does not hold up `ping` or `tools/list`; a single writer task serializes
//! output lines.
//!
//! ```text
//! stdin ──▶ read loop ──spawn──▶ handle_request ──▶ mpsc ──▶ writer ──▶ stdout
//! ```

use crate::error::{McpError, McpResult};
use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, RequestId, ServerCapabilities, ServerInfo, ToolCallResult,
    ToolsCapability, PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::serve::ToolSet;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A tools-only MCP server.
#[derive(Debug, Clone)]
pub struct McpServer {
    name: String,
    version: String,
    instructions: Option<String>,
    tools: Arc<ToolSet>,
}

impl McpServer {
    /// Create a server exposing `tools`.
    pub fn new(name: impl Into<String>, version: impl Into<String>, tools: ToolSet) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            instructions: None,
            tools: Arc::new(tools),
        }
    }

    /// Usage hints sent to the client on `initialize`.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(self) -> McpResult<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        Arc::new(self).serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC from `reader` to `writer`.
    ///
    /// Returns once the reader is exhausted and every in-flight request has
    /// been answered.
    pub async fn serve<R, W>(self: Arc<Self>, mut reader: R, writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!(name = %self.name, tools = self.tools.len(), "MCP server listening on stdio");

        let (tx, rx) = mpsc::channel::<String>(100);
        let writer_task = tokio::spawn(write_loop(rx, writer));

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string(),
                Err(e) => {
                    warn!(error = %e, "Received line that is not valid UTF-8");
                    let response = JsonRpcResponse::failure(
                        None,
                        JsonRpcError::parse_error(format!("Parse error: {e}")),
                    );
                    send_response(&tx, &response).await;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            debug!(line = %line, "Received");

            let server = Arc::clone(&self);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = server.handle_line(&line).await {
                    send_response(&tx, &response).await;
                }
            });
        }

        info!("stdin closed, waiting for in-flight requests");
        drop(tx);

        writer_task
            .await
            .map_err(|e| McpError::protocol_error(format!("writer task failed: {e}")))?
    }

    /// Handle one raw input line.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to parse message");
                return Some(JsonRpcResponse::failure(
                    None,
                    JsonRpcError::parse_error(format!("Parse error: {e}")),
                ));
            }
        };

        if value.is_object() && value.get("method").is_none() {
            // A response from the client; this server never sends requests.
            debug!("Ignoring message without method");
            return None;
        }

        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::invalid_request(format!("Invalid request: {e}")),
            )),
        }
    }

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "Handling MCP request");

        // Notifications (no id) don't expect a response
        let Some(id) = request.id else {
            match request.method.as_str() {
                "notifications/initialized" => debug!("Received initialized notification"),
                "notifications/cancelled" => debug!("Received cancellation notification"),
                _ => debug!(method = %request.method, "Received unknown notification"),
            }
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                Some(id),
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            method => JsonRpcResponse::failure(Some(id), JsonRpcError::method_not_found(method)),
        };
        Some(response)
    }

    /// Handle the initialize request.
    fn handle_initialize(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        let protocol_version = params
            .protocol_version
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(&v.as_str()))
            .unwrap_or_else(|| PROTOCOL_VERSION.to_string());

        info!(
            name = %self.name,
            version = %self.version,
            client = ?params.client_info.as_ref().map(|c| c.name.as_str()),
            protocol_version = %protocol_version,
            "Initializing MCP server"
        );

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: self.name.clone(),
                version: Some(self.version.clone()),
            },
            instructions: self.instructions.clone(),
        };

        to_response(id, &result)
    }

    /// Handle the tools/list request.
    fn handle_list_tools(&self, id: RequestId) -> JsonRpcResponse {
        debug!(count = self.tools.len(), "Listing MCP tools");
        let result = ListToolsResult {
            tools: self.tools.describe(),
        };
        to_response(id, &result)
    }

    /// Handle the tools/call request.
    async fn handle_call_tool(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::failure(
                    Some(id),
                    JsonRpcError::invalid_params(format!("Invalid params: {e}")),
                );
            }
            None => {
                return JsonRpcResponse::failure(
                    Some(id),
                    JsonRpcError::invalid_params("Missing params"),
                );
            }
        };

        let tool = match self.tools.get(&params.name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %params.name, "Call to unknown tool");
                return JsonRpcResponse::failure(Some(id), JsonRpcError::invalid_params(e.to_string()));
            }
        };

        debug!(tool = %params.name, "Calling MCP tool");
        let args = params
            .arguments
            .unwrap_or(Value::Object(serde_json::Map::new()));

        let result = match tool.executor.execute(args).await {
            Ok(output) => {
                debug!(tool = %params.name, output_len = output.len(), "Tool completed successfully");
                ToolCallResult::text(output)
            }
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool failed");
                ToolCallResult::error(e)
            }
        };

        to_response(id, &result)
    }
}

fn to_response<T: serde::Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::failure(
            Some(id),
            JsonRpcError::new(-32603, format!("Failed to serialize result: {e}")),
        ),
    }
}

/// Queue a response for the writer task.
async fn send_response(tx: &mpsc::Sender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(json) => {
            if tx.send(json).await.is_err() {
                warn!("Writer closed before response could be sent");
            }
        }
        Err(e) => error!(error = %e, "Failed to serialize response"),
    }
}

/// Write response lines until every sender is gone.
async fn write_loop<W>(mut rx: mpsc::Receiver<String>, mut writer: W) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(msg) = rx.recv().await {
        debug!(msg = %msg, "Sending");
        writer.write_all(msg.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
