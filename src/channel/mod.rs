//! Message channel - framing contract and echo protocol
//!
//! One logical connection exchanges text frames after a GET upgrade
//! handshake. Each accepted frame is handed to the command processor for
//! side-effect evaluation and then echoed back byte-identically; oversized
//! and empty frames draw no reply.

mod command;

pub use command::{Command, CommandProcessor};

use crate::error::{AgentError, Result};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Owns the framing contract for the message endpoint
pub struct MessageChannel {
    processor: CommandProcessor,
    max_frame_len: usize,
}

impl MessageChannel {
    /// Create a channel dispatching to the given processor, accepting
    /// frames up to `max_frame_len` bytes
    pub fn new(processor: CommandProcessor, max_frame_len: usize) -> Self {
        Self {
            processor,
            max_frame_len,
        }
    }

    /// Maximum accepted frame payload length
    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Decide the fate of one inbound data frame.
    ///
    /// Returns the echo payload for accepted frames, `None` for the
    /// zero-length protocol no-op, and a length-violation error for frames
    /// over the bound. The echo is always the literal received bytes, even
    /// for recognized commands; a pin write failure is logged but does not
    /// suppress the echo.
    pub async fn handle_frame(&self, payload: &[u8]) -> Result<Option<Vec<u8>>> {
        if payload.len() > self.max_frame_len {
            return Err(AgentError::FrameTooLarge {
                len: payload.len(),
                max: self.max_frame_len,
            });
        }

        if payload.is_empty() {
            debug!("zero-length frame, no reply");
            return Ok(None);
        }

        if let Err(e) = self.processor.dispatch(payload).await {
            error!("command dispatch failed: {}", e);
        }

        Ok(Some(payload.to_vec()))
    }
}

/// Shared state for the endpoint route: the framing contract plus the
/// teardown signal every connection watches
#[derive(Clone)]
pub struct ChannelState {
    /// Framing contract shared by all connections
    pub channel: Arc<MessageChannel>,
    /// Endpoint teardown flag; connections close once it is set
    pub shutdown: watch::Receiver<bool>,
}

/// Axum handler for the endpoint route: completes the upgrade handshake
/// and hands the socket to the per-connection loop
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ChannelState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_connection(socket, state.channel, state.shutdown))
}

/// Per-connection frame loop; ends on client close, I/O error, or
/// endpoint teardown
async fn serve_connection(
    socket: WebSocket,
    channel: Arc<MessageChannel>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("handshake done, the new connection was opened");

    let (mut sink, mut stream) = socket.split();

    loop {
        // A set or dropped teardown flag closes the connection; the
        // endpoint owes nothing to frames still in flight.
        let frame = tokio::select! {
            frame = stream.next() => frame,
            _ = async { let _ = shutdown.wait_for(|stopping| *stopping).await; } => {
                debug!("endpoint stopping, closing connection");
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        };

        let Some(frame) = frame else {
            break;
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!("frame receive error: {}", e);
                break;
            }
        };

        match frame {
            Message::Text(text) => {
                match channel.handle_frame(text.as_bytes()).await {
                    Ok(Some(_)) => {
                        // Echo the original frame, not the command's meaning
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            debug!("frame send error: {}", e);
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("dropping frame without reply: {}", e);
                    }
                }
            }
            Message::Binary(_) => {
                debug!("ignoring binary frame");
            }
            Message::Close(_) => {
                debug!("client closed the channel");
                break;
            }
            // Ping/pong are answered by the transport
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    debug!("connection loop ended");
}
