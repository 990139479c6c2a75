//! NDJSON client for the session server.

use std::collections::VecDeque;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::trace;

use crate::api::{Result, RuntimeError};
use crate::protocol::{ClientRequest, RequestEnvelope, ResponseBody, ServerMessage};

pub struct PeerClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    /// Room events read while waiting for a response.
    events: VecDeque<ServerMessage>,
    next_request_id: u64,
}

impl PeerClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(read_half).lines(),
            writer,
            events: VecDeque::new(),
            next_request_id: 1,
        })
    }

    /// Sends `request` and waits for the matching response.
    pub async fn request(&mut self, request: ClientRequest) -> Result<ResponseBody> {
        let id = self.next_request_id;
        self.next_request_id += 1;
        let kind = request.kind();

        let mut line = serde_json::to_string(&RequestEnvelope::new(Some(id), request))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        loop {
            match self.read_message().await? {
                ServerMessage::Response {
                    id: Some(received),
                    success,
                    error,
                    code,
                    body,
                } if received == id => {
                    if success {
                        return Ok(body);
                    }
                    return Err(RuntimeError::Refused {
                        request: kind,
                        code: code.unwrap_or_default(),
                        message: error.unwrap_or_default(),
                    });
                }
                message if message.is_response() => {
                    trace!(?message, "dropping uncorrelated response");
                }
                event => self.events.push_back(event),
            }
        }
    }

    /// Next room event, buffered ones first.
    pub async fn next_event(&mut self) -> Result<ServerMessage> {
        if let Some(event) = self.events.pop_front() {
            return Ok(event);
        }
        loop {
            let message = self.read_message().await?;
            if !message.is_response() {
                return Ok(message);
            }
        }
    }

    async fn read_message(&mut self) -> Result<ServerMessage> {
        let line = self
            .lines
            .next_line()
            .await?
            .ok_or(RuntimeError::ConnectionClosed)?;
        Ok(serde_json::from_str(&line)?)
    }
}
