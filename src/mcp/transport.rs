//! Line-delimited stdio transport that screens frames before the MCP service
//! sees them.
//!
//! The service ends its session on the first line it cannot decode. Lines are
//! read as raw bytes here instead, and anything that is not a decodable client
//! message is answered with a JSON-RPC error while the stream keeps going.

use rmcp::model::{ClientJsonRpcMessage, ErrorCode};
use serde_json::{json, Value};
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream,
};
use tokio::sync::mpsc;

const PIPE_CAPACITY: usize = 64 * 1024;

/// Transport over the process's stdin and stdout.
pub fn stdio() -> (DuplexStream, DuplexStream) {
    filtered(BufReader::new(io::stdin()), io::stdout())
}

/// Returns the `(reader, writer)` pair the service runs on. Valid frames from
/// `input` are passed through; error replies for rejected frames are written
/// to `output` alongside the service's own responses, one line each.
pub fn filtered<R, W>(input: R, output: W) -> (DuplexStream, DuplexStream)
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (to_service, service_reader) = io::duplex(PIPE_CAPACITY);
    let (service_writer, from_service) = io::duplex(PIPE_CAPACITY);
    let (replies_tx, replies_rx) = mpsc::channel(16);

    tokio::spawn(async move {
        if let Err(e) = forward_requests(input, to_service, replies_tx).await {
            tracing::error!(error = %e, "reading requests failed");
        }
    });
    tokio::spawn(async move {
        let responses = BufReader::new(from_service);
        if let Err(e) = forward_responses(responses, replies_rx, output).await {
            tracing::error!(error = %e, "writing responses failed");
        }
    });

    (service_reader, service_writer)
}

#[derive(Debug, PartialEq)]
enum Screened {
    Forward,
    Reply(String),
    Discard,
}

fn screen(frame: &[u8]) -> Screened {
    let value: Value = match serde_json::from_slice(frame) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable frame");
            return Screened::Reply(error_reply(
                Value::Null,
                ErrorCode::PARSE_ERROR,
                format!("Parse error: {e}"),
            ));
        }
    };
    let id = value.get("id").cloned();
    if id == Some(Value::Null) {
        return Screened::Reply(error_reply(
            Value::Null,
            ErrorCode::INVALID_REQUEST,
            "Request id must be a string or a number".to_string(),
        ));
    }
    let is_object = value.is_object();
    match serde_json::from_value::<ClientJsonRpcMessage>(value) {
        Ok(_) => Screened::Forward,
        Err(e) => match id {
            Some(id) => Screened::Reply(error_reply(
                id,
                ErrorCode::INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
            None if !is_object => Screened::Reply(error_reply(
                Value::Null,
                ErrorCode::INVALID_REQUEST,
                "Invalid request: expected a JSON object".to_string(),
            )),
            None => {
                tracing::warn!(error = %e, "dropping undecodable notification");
                Screened::Discard
            }
        },
    }
}

fn error_reply(id: Value, code: ErrorCode, message: String) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code.0, "message": message }
    })
    .to_string()
}

async fn forward_requests<R, W>(
    mut input: R,
    mut service: W,
    replies: mpsc::Sender<String>,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        let frame = line.trim_ascii();
        if frame.is_empty() {
            continue;
        }
        match screen(frame) {
            Screened::Forward => {
                service.write_all(frame).await?;
                service.write_all(b"\n").await?;
                service.flush().await?;
            }
            Screened::Reply(reply) => {
                if replies.send(reply).await.is_err() {
                    break;
                }
            }
            Screened::Discard => {}
        }
    }
    tracing::debug!("input closed");
    service.shutdown().await
}

async fn forward_responses<R, W>(
    responses: R,
    mut replies: mpsc::Receiver<String>,
    mut output: W,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut responses = responses.lines();
    let mut replies_open = true;
    loop {
        let line = tokio::select! {
            line = responses.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            reply = replies.recv(), if replies_open => match reply {
                Some(reply) => reply,
                None => {
                    replies_open = false;
                    continue;
                }
            },
        };
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }
    Ok(())
}
