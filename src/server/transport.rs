//! Newline-delimited JSON-RPC over a byte stream.
//!
//! One JSON message per line in each direction. The server runs until the
//! reader reaches EOF. Diagnostics go to stderr via tracing; nothing but
//! responses is ever written to the output stream.

use crate::server::McpServer;
use crate::server::protocol::{McpError, McpRequest, McpResponse, ProtocolError};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Serve requests from `reader` until EOF, writing responses to `writer`.
pub async fn serve<R, W>(
    server: &mut McpServer,
    mut reader: R,
    mut writer: W,
) -> Result<(), ProtocolError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = buf.trim_ascii();
        if line.is_empty() {
            continue;
        }

        // Invalid UTF-8 surfaces here as a parse error like any other bad line.
        let response = match serde_json::from_slice::<McpRequest>(line) {
            Ok(request) => {
                debug!("<- {}", request.method);
                server.handle(request).await
            }
            Err(e) => {
                warn!("Unparseable message: {}", e);
                Some(McpResponse::err(
                    Value::Null,
                    McpError::parse_error(format!("Parse error: {}", e)),
                ))
            }
        };

        if let Some(response) = response {
            write_message(&mut writer, &response).await?;
        }
    }

    info!("Input closed, shutting down");
    Ok(())
}

async fn write_message<W>(writer: &mut W, response: &McpResponse) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let mut bytes = serde_json::to_vec(response)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Serve on the process's stdin and stdout.
pub async fn serve_stdio(server: &mut McpServer) -> Result<(), ProtocolError> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(server, stdin, stdout).await
}
