//! WebSocket channel transport.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;

use aeoracle_core::error::TransportError;
use aeoracle_core::transport::{ChannelEvent, ChannelTransport};

/// Configuration for the WebSocket channel.
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    /// Give up on the opening handshake after this long.
    pub connect_timeout: Duration,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Command sent from callers to the background WS task.
enum WsCommand {
    Send {
        text: String,
        tx: oneshot::Sender<Result<(), TransportError>>,
    },
    Close,
}

/// WebSocket channel to a node.
///
/// A background task owns the connection. Inbound frames and open/close
/// notifications are delivered on the receiver returned by [`connect`].
/// The connection is not re-established after it closes.
///
/// [`connect`]: WsChannel::connect
pub struct WsChannel {
    url: String,
    cmd_tx: mpsc::UnboundedSender<WsCommand>,
}

impl WsChannel {
    /// Start connecting to `url` in the background.
    ///
    /// Returns immediately; `ChannelEvent::Opened` (or `Closed` if the
    /// handshake fails) arrives on the returned receiver.
    pub async fn connect(
        url: impl Into<String>,
        config: WsClientConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChannelEvent>), TransportError> {
        let url = url.into();
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TransportError::WebSocket(format!(
                "unsupported WebSocket URL: {url}"
            )));
        }

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<WsCommand>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<ChannelEvent>();
        let url_clone = url.clone();

        tokio::spawn(async move {
            ws_task(url_clone, cmd_rx, event_tx.clone(), config).await;
            let _ = event_tx.send(ChannelEvent::Closed);
        });

        Ok((Self { url, cmd_tx }, event_rx))
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(WsCommand::Close);
    }
}

#[async_trait]
impl ChannelTransport for WsChannel {
    async fn send(&self, text: String) -> Result<(), TransportError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(WsCommand::Send { text, tx })
            .map_err(|_| TransportError::Closed)?;
        rx.await.map_err(|_| TransportError::Closed)?
    }

    fn close(&self) {
        let _ = self.cmd_tx.send(WsCommand::Close);
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Background task that owns the WebSocket connection.
///
/// Returns when the socket closes, fails, or a `Close` command arrives. The
/// caller emits `ChannelEvent::Closed` afterwards.
async fn ws_task(
    url: String,
    mut cmd_rx: mpsc::UnboundedReceiver<WsCommand>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    config: WsClientConfig,
) {
    tracing::info!(url = %url, "connecting via WebSocket");

    let conn = time::timeout(config.connect_timeout, tokio_tungstenite::connect_async(&url)).await;
    let ws_stream = match conn {
        Err(_) => {
            tracing::warn!(url = %url, timeout = ?config.connect_timeout, "WS connect timed out");
            return;
        }
        Ok(Err(e)) => {
            tracing::warn!(url = %url, error = %e, "WS connect failed");
            return;
        }
        Ok(Ok((ws_stream, _))) => ws_stream,
    };

    tracing::info!(url = %url, "WebSocket connection is open");
    let _ = events.send(ChannelEvent::Opened);
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            // Outgoing frames from callers
            cmd = cmd_rx.recv() => {
                match cmd {
                    None | Some(WsCommand::Close) => {
                        let _ = sink.close().await;
                        break;
                    }
                    Some(WsCommand::Send { text, tx }) => {
                        let result = sink
                            .send(Message::Text(text.into()))
                            .await
                            .map_err(|e| TransportError::WebSocket(e.to_string()));
                        if let Err(e) = &result {
                            tracing::warn!(url = %url, error = %e, "WS send failed");
                        }
                        let _ = tx.send(result);
                    }
                }
            }
            // Incoming frames from the node
            msg = stream.next() => {
                match msg {
                    None => break,
                    Some(Err(e)) => {
                        tracing::warn!(url = %url, error = %e, "WS receive error");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        tracing::trace!(data = %text.as_str(), "WS frame received");
                        let _ = events.send(ChannelEvent::Message(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Close(_))) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(url = %url, "WebSocket connection closed");
}
