use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use colored::*;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::logview::LogViewerError;

/// Runs the tool server in the foreground with inherited stdio.
pub async fn run_server(server_bin: &str, log_file: &Path) -> Result<(), LogViewerError> {
    info!(server_bin, log_file = %log_file.display(), "launching tool server");
    let status = Command::new(server_bin)
        .env("RULE_QUERY_LOG_FILE", log_file)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|err| launch_error(server_bin, err.to_string()))?;

    if status.success() {
        Ok(())
    } else {
        Err(launch_error(server_bin, format!("exited with {status}")))
    }
}

/// Messages sent by the `test` command, in order.
pub fn smoke_requests(order_id: &str) -> Vec<Value> {
    vec![
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "rule-query-logs", "version": env!("CARGO_PKG_VERSION")}
            }
        }),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "fetch_order_status", "arguments": {"order_id": order_id}}
        }),
    ]
}

/// Starts the tool server, sends [`smoke_requests`] and prints every reply.
pub async fn test_server(
    server_bin: &str,
    log_file: &Path,
    order_id: &str,
    reply_timeout: Duration,
) -> Result<(), LogViewerError> {
    let mut child = Command::new(server_bin)
        .env("RULE_QUERY_LOG_FILE", log_file)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| launch_error(server_bin, err.to_string()))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| launch_error(server_bin, "stdin unavailable".into()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| launch_error(server_bin, "stdout unavailable".into()))?;
    let mut replies = BufReader::new(stdout).lines();

    for request in smoke_requests(order_id) {
        let expects_reply = request.get("id").is_some();
        let line = format!("{request}\n");
        println!("{} {}", "->".cyan(), request);
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|err| launch_error(server_bin, err.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|err| launch_error(server_bin, err.to_string()))?;

        if !expects_reply {
            continue;
        }

        let reply = tokio::time::timeout(reply_timeout, replies.next_line())
            .await
            .map_err(|_| launch_error(server_bin, "timed out waiting for reply".into()))?
            .map_err(|err| launch_error(server_bin, err.to_string()))?
            .ok_or_else(|| launch_error(server_bin, "server closed its output".into()))?;

        debug!(reply = %reply, "reply received");
        println!("{} {}", "<-".green(), pretty(&reply));
    }

    drop(stdin);
    let status = child
        .wait()
        .await
        .map_err(|err| launch_error(server_bin, err.to_string()))?;
    info!(%status, "tool server exited");
    Ok(())
}

fn pretty(reply: &str) -> String {
    serde_json::from_str::<Value>(reply)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| reply.to_string())
}

fn launch_error(command: &str, message: String) -> LogViewerError {
    LogViewerError::Launch {
        command: command.to_string(),
        message,
    }
}
