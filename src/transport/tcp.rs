//! Line-framed TCP transport, plain or TLS.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use super::line::LineCodec;
use super::{Transport, TransportError};

/// IRC over TCP, one CRLF-terminated line per frame.
#[allow(clippy::large_enum_variant)]
pub enum TcpTransport {
    /// Plaintext.
    Plain {
        /// The framed codec for TCP.
        framed: Framed<TcpStream, LineCodec>,
    },
    /// Client-side TLS.
    Tls {
        /// The framed codec for TLS.
        framed: Framed<TlsStream<TcpStream>, LineCodec>,
    },
}

impl TcpTransport {
    /// Connect to `host:port`, upgrading to TLS if `tls` is set.
    pub async fn connect(host: &str, port: u16, tls: bool) -> Result<Self, TransportError> {
        let stream = TcpStream::connect((host, port)).await?;
        debug!(host, port, tls, "tcp connected");

        if tls {
            let stream = upgrade_to_tls(stream, host).await?;
            Ok(Self::tls(stream))
        } else {
            Ok(Self::plain(stream))
        }
    }

    /// Wrap an established plaintext stream.
    pub fn plain(stream: TcpStream) -> Self {
        if let Err(e) = Self::enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        Self::Plain {
            framed: Framed::new(stream, LineCodec::new()),
        }
    }

    /// Wrap an established TLS stream.
    pub fn tls(stream: TlsStream<TcpStream>) -> Self {
        if let Err(e) = Self::enable_keepalive(stream.get_ref().0) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        Self::Tls {
            framed: Framed::new(stream, LineCodec::new()),
        }
    }

    fn enable_keepalive(stream: &TcpStream) -> anyhow::Result<()> {
        use socket2::{SockRef, TcpKeepalive};

        let sock = SockRef::from(stream);
        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));

        sock.set_tcp_keepalive(&keepalive)?;
        Ok(())
    }

    /// Whether the connection is encrypted.
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls { .. })
    }
}

fn native_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!("failed to add root cert: {}", e);
        }
    }
    for e in &certs.errors {
        warn!("error loading native certs: {}", e);
    }
    roots
}

async fn upgrade_to_tls(
    stream: TcpStream,
    host: &str,
) -> Result<TlsStream<TcpStream>, TransportError> {
    let config = ClientConfig::builder()
        .with_root_certificates(native_roots())
        .with_no_client_auth();

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|_| TransportError::InvalidServerName(host.to_owned()))?;

    Ok(connector.connect(server_name, stream).await?)
}

macro_rules! send_lines {
    ($framed:expr, $lines:expr) => {{
        for line in $lines {
            $framed.feed(line.as_str()).await?;
        }
        SinkExt::<&str>::flush($framed).await
    }};
}

#[async_trait]
impl Transport for TcpTransport {
    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        let next = match self {
            Self::Plain { framed } => framed.next().await,
            Self::Tls { framed } => framed.next().await,
        };
        next.transpose()
    }

    async fn send(&mut self, lines: &[String]) -> Result<(), TransportError> {
        match self {
            Self::Plain { framed } => send_lines!(framed, lines),
            Self::Tls { framed } => send_lines!(framed, lines),
        }
    }

    async fn dispose(&mut self) -> Result<(), TransportError> {
        match self {
            Self::Plain { framed } => SinkExt::<&str>::close(framed).await,
            Self::Tls { framed } => SinkExt::<&str>::close(framed).await,
        }
    }
}
