//! IRC over WebSocket, as Twitch serves it.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::line::{inspect_line, MAX_IRC_LINE_LEN};
use super::{Transport, TransportError};

/// Twitch's chat endpoint.
pub const TWITCH_WEBSOCKET_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Largest accepted inbound frame. A frame may batch many lines.
const MAX_FRAME_LEN: usize = MAX_IRC_LINE_LEN * 16;

/// IRC over WebSocket. Each inbound text frame is one chunk of one or more
/// lines; each outbound line is sent as its own text frame.
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketTransport {
    /// Open a WebSocket connection to `url` (`ws://` or `wss://`).
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (stream, response) = connect_async(url).await?;
        debug!(url, status = %response.status(), "websocket connected");
        Ok(Self { stream })
    }

    /// Wrap an established WebSocket stream.
    pub fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    if text.len() > MAX_FRAME_LEN {
                        return Err(TransportError::LineTooLong {
                            actual: text.len(),
                            limit: MAX_FRAME_LEN,
                        });
                    }
                    inspect_line(&text);
                    return Ok(Some(text));
                }
                Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
                Some(Ok(WsMessage::Binary(_))) => {
                    warn!("ignoring binary WebSocket frame (IRC is text-only)");
                    continue;
                }
                Some(Ok(WsMessage::Frame(_))) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn send(&mut self, lines: &[String]) -> Result<(), TransportError> {
        for line in lines {
            let line = line.trim_end_matches(['\r', '\n']);
            self.stream.feed(WsMessage::Text(line.to_owned())).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }

    async fn dispose(&mut self) -> Result<(), TransportError> {
        match self.stream.close(None).await {
            Ok(()) | Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
