//! Transports: where raw lines come from and go to.
//!
//! The core never opens sockets itself. The [`Client`](crate::Client) talks
//! to a [`Transport`], and this module ships the two a Twitch or IRC client
//! needs: [`TcpTransport`] (plain or TLS) and [`WebSocketTransport`].

mod line;
mod tcp;
mod websocket;

use async_trait::async_trait;
use thiserror::Error;

pub use self::line::{LineCodec, MAX_IRC_LINE_LEN};
pub use self::tcp::TcpTransport;
pub use self::websocket::{WebSocketTransport, TWITCH_WEBSOCKET_URL};

/// Default port for IRC over TLS.
pub const DEFAULT_TLS_PORT: u16 = 6697;
/// Default port for plaintext IRC.
pub const DEFAULT_PLAIN_PORT: u16 = 6667;

/// A bidirectional line channel to a server.
///
/// [`Transport::receive`] must be cancel-safe: the client polls it
/// concurrently with its outbound queue and drops the future whenever an
/// outbound request wins.
#[async_trait]
pub trait Transport: Send {
    /// The next chunk of inbound text, one or more CRLF-separated lines.
    /// `Ok(None)` means the server closed the connection.
    async fn receive(&mut self) -> Result<Option<String>, TransportError>;

    /// Send `lines`, each without its CRLF terminator, in order. Lines are
    /// never split; a failure part-way fails the whole call.
    async fn send(&mut self, lines: &[String]) -> Result<(), TransportError>;

    /// Close the connection.
    async fn dispose(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        (**self).receive().await
    }

    async fn send(&mut self, lines: &[String]) -> Result<(), TransportError> {
        (**self).send(lines).await
    }

    async fn dispose(&mut self) -> Result<(), TransportError> {
        (**self).dispose().await
    }
}

/// Transport failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The socket failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The host name is not usable for TLS.
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),

    /// The WebSocket layer failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// An inbound line exceeded the length limit.
    #[error("line too long: {actual} bytes (limit {limit})")]
    LineTooLong {
        /// Bytes received.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The transport or client was disposed while the operation was pending.
    #[error("transport disposed")]
    Disposed,
}
