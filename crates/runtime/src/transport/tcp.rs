//! NDJSON transport over TCP.
//!
//! Each accepted socket becomes one [`Connection`](crate::api::Connection):
//! a reader task parses one request per line and forwards it to the session
//! worker, and a writer task serializes outbox messages one per line. Lines
//! that fail to parse, are not UTF-8 or exceed [`MAX_LINE_BYTES`] are
//! answered with an `INVALID_MESSAGE` response and the connection stays
//! open. An oversized line is discarded up to its newline without being
//! buffered.

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{ConnectionSender, Result, ServerHandle};
use crate::protocol::{RequestEnvelope, ServerMessage};

/// Longest accepted request line in bytes.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

pub struct TcpGateway {
    listener: TcpListener,
    handle: ServerHandle,
}

impl TcpGateway {
    pub async fn bind(addr: SocketAddr, handle: ServerHandle) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, handle })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the process ends.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves. Connections already
    /// accepted keep running on their own tasks.
    pub async fn serve_with_shutdown(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(addr = %self.local_addr()?, "accepting connections");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            warn!("accept failed: {err}");
                            continue;
                        }
                    };
                    let handle = self.handle.clone();
                    tokio::spawn(async move {
                        if let Err(err) = serve_connection(stream, handle).await {
                            debug!(%peer, "connection ended with error: {err}");
                        }
                    });
                }
                () = &mut shutdown => break,
            }
        }

        info!("gateway stopped");
        Ok(())
    }
}

async fn serve_connection(stream: TcpStream, handle: ServerHandle) -> Result<()> {
    stream.set_nodelay(true)?;
    let peer = stream.peer_addr()?;
    let (read_half, write_half) = stream.into_split();

    let connection = handle.connect().await?;
    let (sender, outbox) = connection.into_split();
    info!(%peer, connection = %sender.id(), "client connected");

    let writer = tokio::spawn(write_loop(write_half, outbox));
    let read_result = read_loop(read_half, &sender).await;

    let id = sender.id();
    sender.close().await?;
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => debug!(connection = %id, "writer stopped: {err}"),
        Err(err) => warn!(connection = %id, "writer task failed: {err}"),
    }
    info!(%peer, connection = %id, "client disconnected");
    read_result
}

async fn read_loop(read_half: OwnedReadHalf, sender: &ConnectionSender) -> Result<()> {
    let mut reader = BufReader::new(read_half);

    loop {
        let bytes = match next_frame(&mut reader).await? {
            Frame::Eof => return Ok(()),
            Frame::Oversized => {
                debug!(connection = %sender.id(), "discarded oversized request");
                sender.reject(None, "INVALID_MESSAGE", "message too large")?;
                continue;
            }
            Frame::Line(bytes) => bytes,
        };
        let Ok(text) = String::from_utf8(bytes) else {
            debug!(connection = %sender.id(), "request is not valid UTF-8");
            sender.reject(None, "INVALID_MESSAGE", "message is not valid UTF-8")?;
            continue;
        };
        let line = text.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<RequestEnvelope>(line) {
            Ok(envelope) => sender.send(envelope).await?,
            Err(err) => {
                debug!(connection = %sender.id(), "unparseable request: {err}");
                sender.reject(request_id(line), "INVALID_MESSAGE", err.to_string())?;
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(Vec<u8>),
    Oversized,
    Eof,
}

/// Reads up to the next newline, holding at most [`MAX_LINE_BYTES`] of it.
///
/// Once a line overflows, the rest of it is consumed and dropped as it
/// arrives. A trailing line without a newline still counts at end of input.
async fn next_frame<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Frame> {
    let mut line = Vec::new();
    let mut oversized = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(match (oversized, line.is_empty()) {
                (true, _) => Frame::Oversized,
                (false, true) => Frame::Eof,
                (false, false) => Frame::Line(line),
            });
        }

        let (used, complete) = match available.iter().position(|&byte| byte == b'\n') {
            Some(end) => (end + 1, true),
            None => (available.len(), false),
        };
        let content = if complete { used - 1 } else { used };
        if !oversized {
            if line.len() + content > MAX_LINE_BYTES {
                oversized = true;
                line = Vec::new();
            } else {
                line.extend_from_slice(&available[..content]);
            }
        }
        reader.consume(used);

        if complete {
            return Ok(if oversized { Frame::Oversized } else { Frame::Line(line) });
        }
    }
}

/// Best-effort id extraction so a malformed request is still correlated.
fn request_id(line: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()?
        .get("id")?
        .as_u64()
}

async fn write_loop(
    write_half: OwnedWriteHalf,
    mut outbox: mpsc::UnboundedReceiver<ServerMessage>,
) -> Result<()> {
    let mut writer = BufWriter::new(write_half);
    while let Some(message) = outbox.recv().await {
        let line = message.to_line()?;
        writer.write_all(line.as_bytes()).await?;
        // Flush only once the burst is drained.
        if outbox.is_empty() {
            writer.flush().await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_recovered_from_partial_requests() {
        assert_eq!(request_id(r#"{"type":"fly","id":9}"#), Some(9));
        assert_eq!(request_id(r#"{"type":"fly"}"#), None);
        assert_eq!(request_id("not json"), None);
    }

    #[tokio::test]
    async fn frames_split_on_newlines_and_keep_a_trailing_line() {
        let mut input = BufReader::new(&b"one\n\ntwo"[..]);
        assert_eq!(next_frame(&mut input).await.unwrap(), Frame::Line(b"one".to_vec()));
        assert_eq!(next_frame(&mut input).await.unwrap(), Frame::Line(Vec::new()));
        assert_eq!(next_frame(&mut input).await.unwrap(), Frame::Line(b"two".to_vec()));
        assert_eq!(next_frame(&mut input).await.unwrap(), Frame::Eof);
    }

    #[tokio::test]
    async fn oversized_lines_are_skipped_to_the_next_newline() {
        let mut bytes = vec![b'x'; MAX_LINE_BYTES + 1];
        bytes.extend_from_slice(b"\nnext\n");
        let mut reader = BufReader::with_capacity(1024, bytes.as_slice());

        assert_eq!(next_frame(&mut reader).await.unwrap(), Frame::Oversized);
        assert_eq!(next_frame(&mut reader).await.unwrap(), Frame::Line(b"next".to_vec()));
        assert_eq!(next_frame(&mut reader).await.unwrap(), Frame::Eof);
    }

    #[tokio::test]
    async fn a_line_of_exactly_the_limit_is_accepted() {
        let mut bytes = vec![b'x'; MAX_LINE_BYTES];
        bytes.push(b'\n');
        let mut reader = BufReader::with_capacity(1024, bytes.as_slice());

        match next_frame(&mut reader).await.unwrap() {
            Frame::Line(line) => assert_eq!(line.len(), MAX_LINE_BYTES),
            other => panic!("expected line, got {other:?}"),
        }
    }
}
