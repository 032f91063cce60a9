//! MCP server loop handling newline-delimited JSON-RPC messages.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::handlers::ToolHandlers;
use crate::protocol::*;
use crate::tools::tool_definitions;

pub const SERVER_NAME: &str = "rule-query-server";

/// Tool server speaking MCP over a line-oriented byte stream.
pub struct McpServer {
    handlers: ToolHandlers,
}

impl McpServer {
    pub fn new(handlers: ToolHandlers) -> Self {
        Self { handlers }
    }

    /// Serves requests from stdin, writing responses to stdout, until EOF.
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serves requests read line by line from `reader` until EOF. Requests are
    /// answered one at a time in arrival order.
    ///
    /// A line that is not valid UTF-8 is answered with a parse error and the
    /// loop carries on.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = SERVER_NAME, "tool server started, waiting for messages");
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(text) => {
                    let line = text.trim();
                    if line.is_empty() {
                        continue;
                    }
                    debug!(message = %preview(line), "<- received");
                    self.handle_message(line).await
                }
                Err(err) => {
                    warn!(error = %err, bytes = buf.len(), "received line that is not UTF-8");
                    Some(JsonRpcResponse::error(
                        None,
                        PARSE_ERROR,
                        format!("invalid UTF-8: {err}"),
                    ))
                }
            };

            let Some(response) = response else {
                continue;
            };

            let mut out = serde_json::to_string(&response)?;
            debug!(message = %preview(&out), "-> sending");
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }

        info!(server = SERVER_NAME, "input closed, tool server shutting down");
        Ok(())
    }

    /// Handles one JSON-RPC message. Notifications produce no response.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "received malformed JSON");
                return Some(JsonRpcResponse::error(None, PARSE_ERROR, err.to_string()));
            }
        };

        let id = raw.get("id").cloned().filter(|id| !id.is_null());
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "received invalid request");
                return Some(JsonRpcResponse::error(id, INVALID_REQUEST, err.to_string()));
            }
        };

        if request.is_notification() {
            debug!(method = %request.method, "notification received");
            return None;
        }

        Some(self.handle_request(request).await)
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => {
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.into(),
                    capabilities: ServerCapabilities {
                        tools: ToolsCapability {
                            list_changed: false,
                        },
                    },
                    server_info: ServerInfo {
                        name: SERVER_NAME.into(),
                        version: env!("CARGO_PKG_VERSION").into(),
                    },
                };
                to_response(id, result)
            }

            "ping" => JsonRpcResponse::success(id, json!({})),

            "tools/list" => to_response(
                id,
                ToolsListResult {
                    tools: tool_definitions(),
                },
            ),

            "tools/call" => {
                let params: ToolCallParams = match serde_json::from_value(request.params) {
                    Ok(params) => params,
                    Err(err) => return JsonRpcResponse::error(id, INVALID_PARAMS, err.to_string()),
                };

                let result = self.handlers.handle(&params.name, params.arguments).await;
                to_response(id, result)
            }

            other => {
                warn!(method = other, "unknown method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {other}"))
            }
        }
    }
}

fn to_response<T: serde::Serialize>(id: Option<Value>, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => JsonRpcResponse::error(
            id,
            INTERNAL_ERROR,
            format!("Serialization error: {err}"),
        ),
    }
}

fn preview(message: &str) -> String {
    const LIMIT: usize = 200;
    if message.chars().count() > LIMIT {
        let truncated: String = message.chars().take(LIMIT).collect();
        format!("{truncated}...")
    } else {
        message.to_string()
    }
}
