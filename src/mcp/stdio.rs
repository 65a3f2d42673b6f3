//! Line-delimited JSON-RPC over stdin/stdout.
//!
//! Each request is handled on its own task so a long generation wait does not
//! block pings or other tool calls. Responses are funnelled through a single
//! writer task and may therefore arrive out of request order.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::mcp::rpc::{self, OutboundResponse};
use crate::mcp::service::McpService;

const OUTBOUND_BUFFER: usize = 64;

/// Serve requests read from `reader` until EOF.
///
/// Returns once every in-flight request has written its response.
pub async fn serve<R, W>(service: McpService, reader: R, writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<OutboundResponse>(OUTBOUND_BUFFER);
    let writer_task = tokio::spawn(write_responses(rx, writer));

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request = match rpc::decode(line.as_bytes()) {
            Ok(request) => request,
            Err(response) => {
                if tx.send(response).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let service = service.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = service.handle_request(request).await {
                if tx.send(response).await.is_err() {
                    log::warn!("stdout closed before a response could be written");
                }
            }
        });
    }

    log::info!("stdin closed, waiting for in-flight requests");
    drop(tx);
    match writer_task.await {
        Ok(result) => result,
        Err(err) => Err(std::io::Error::new(std::io::ErrorKind::Other, err)),
    }
}

async fn write_responses<W>(
    mut rx: mpsc::Receiver<OutboundResponse>,
    mut writer: W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = match serde_json::to_vec(&response) {
            Ok(line) => line,
            Err(err) => {
                log::error!("failed to encode response: {}", err);
                continue;
            }
        };
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
