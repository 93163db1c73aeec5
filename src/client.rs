//! The async client: one connection, one driver task.
//!
//! [`Client::connect`] opens a transport, spawns a driver task that owns it,
//! and starts the registration handshake. Inbound commands arrive on the
//! [`CommandStream`] handed back next to the client; outbound lines go
//! through [`Client::send_lines`], [`Client::join`] and [`Client::part`].
//!
//! The driver answers server PINGs on its own. The inbound channel is
//! bounded, so a consumer that stops polling the stream eventually stalls
//! the driver, outbound sends included.
//!
//! # Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use slirc_client::{Client, ClientConfig, Command};
//!
//! # async fn run() -> Result<(), slirc_client::ProtocolError> {
//! let (client, mut commands) = Client::connect(ClientConfig::twitch()).await?;
//! client.join("rust").await?;
//!
//! while let Some(command) = commands.next().await {
//!     if let Command::Privmsg { target, text, .. } = command? {
//!         println!("{}: {}", target, text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::batch::{Batch, ParseErrorPolicy};
use crate::caps::Capability;
use crate::chan::Channel;
use crate::channels::{self, ChannelSet, Membership};
use crate::command::Command;
use crate::error::{ConfigurationError, ProtocolError};
use crate::keepalive;
use crate::state::{HandshakeConfig, HandshakeMachine};
use crate::transport::{
    TcpTransport, Transport, TransportError, WebSocketTransport, TWITCH_WEBSOCKET_URL,
};

/// Default capacity of the inbound command channel.
pub const DEFAULT_INBOUND_CAPACITY: usize = 256;

/// Nickname Twitch accepts for read-only anonymous logins.
pub const TWITCH_ANONYMOUS_NICK: &str = "justinfan12345";
/// Password sent with the anonymous Twitch login.
pub const TWITCH_ANONYMOUS_PASSWORD: &str = "SCHMOOPIE";

/// Where to connect.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Endpoint {
    /// Line-framed TCP, optionally wrapped in TLS.
    Tcp {
        /// Server host name.
        host: String,
        /// Server port.
        port: u16,
        /// Whether to negotiate TLS.
        tls: bool,
    },
    /// A WebSocket URL (`ws://` or `wss://`).
    WebSocket {
        /// The URL to connect to.
        url: String,
    },
}

impl Endpoint {
    async fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        match self {
            Endpoint::Tcp { host, port, tls } => {
                let transport = TcpTransport::connect(host, *port, *tls).await?;
                Ok(Box::new(transport))
            }
            Endpoint::WebSocket { url } => {
                let transport = WebSocketTransport::connect(url).await?;
                Ok(Box::new(transport))
            }
        }
    }
}

/// Everything [`Client::connect`] needs.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// Identity and capabilities.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub handshake: HandshakeConfig,
    /// Server to connect to. Not needed with [`Client::with_transport`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub endpoint: Option<Endpoint>,
    /// What to do with lines that fail to parse.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parse_errors: ParseErrorPolicy,
    /// How many commands may wait in the stream before the driver blocks.
    #[cfg_attr(feature = "serde", serde(default = "default_inbound_capacity"))]
    pub inbound_capacity: usize,
}

#[cfg(feature = "serde")]
fn default_inbound_capacity() -> usize {
    DEFAULT_INBOUND_CAPACITY
}

impl ClientConfig {
    /// A config with a nickname and nothing else.
    pub fn new(nickname: impl Into<String>) -> Self {
        Self::from_handshake(HandshakeConfig::new(nickname))
    }

    /// Wrap an existing handshake config.
    pub fn from_handshake(handshake: HandshakeConfig) -> Self {
        Self {
            handshake,
            endpoint: None,
            parse_errors: ParseErrorPolicy::default(),
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
        }
    }

    /// Anonymous read-only Twitch chat over WebSocket, with the tags,
    /// membership and commands capabilities.
    pub fn twitch() -> Self {
        let handshake = HandshakeConfig {
            password: Some(TWITCH_ANONYMOUS_PASSWORD.to_owned()),
            capabilities: Capability::twitch(),
            ..HandshakeConfig::new(TWITCH_ANONYMOUS_NICK)
        };
        Self::from_handshake(handshake).with_endpoint(Endpoint::WebSocket {
            url: TWITCH_WEBSOCKET_URL.to_owned(),
        })
    }

    /// Set the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the parse error policy.
    #[must_use]
    pub fn with_parse_errors(mut self, policy: ParseErrorPolicy) -> Self {
        self.parse_errors = policy;
        self
    }

    /// Set the inbound channel capacity. Zero is raised to one.
    #[must_use]
    pub fn with_inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity;
        self
    }
}

enum Request {
    Send {
        lines: Vec<String>,
        done: oneshot::Sender<Result<(), TransportError>>,
    },
    Dispose {
        done: oneshot::Sender<()>,
    },
}

type Inbound = Result<Command, ProtocolError>;

/// Handle to a running connection.
///
/// Dropping the client disposes the transport.
#[derive(Debug)]
pub struct Client {
    requests: mpsc::UnboundedSender<Request>,
    channels: Arc<ChannelSet>,
    handshake: Option<JoinHandle<Result<(), ProtocolError>>>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Request::Send { lines, .. } => f.debug_struct("Send").field("lines", lines).finish(),
            Request::Dispose { .. } => f.write_str("Dispose"),
        }
    }
}

impl Client {
    /// Validate `config`, open its endpoint and start the session.
    ///
    /// Configuration errors are reported before any I/O happens.
    pub async fn connect(config: ClientConfig) -> Result<(Client, CommandStream), ProtocolError> {
        config.handshake.validate()?;
        let endpoint = config
            .endpoint
            .as_ref()
            .ok_or(ConfigurationError::MissingTransport)?;
        debug!(?endpoint, "connecting");
        let transport = endpoint.open().await?;
        Ok(Client::with_transport(config, transport)?)
    }

    /// Start a session over an already-open transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_transport<T>(
        config: ClientConfig,
        transport: T,
    ) -> Result<(Client, CommandStream), ConfigurationError>
    where
        T: Transport + 'static,
    {
        config.handshake.validate()?;

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity.max(1));

        let driver = Driver {
            transport,
            requests: request_rx,
            inbound: inbound_tx,
            policy: config.parse_errors,
        };
        tokio::spawn(driver.run());

        let handshake = tokio::spawn(register(
            HandshakeMachine::new(config.handshake),
            request_tx.clone(),
        ));

        let client = Client {
            requests: request_tx,
            channels: Arc::new(ChannelSet::new()),
            handshake: Some(handshake),
        };
        Ok((client, CommandStream { inbound: inbound_rx }))
    }

    /// Wait for every handshake line to be written.
    ///
    /// Resolves once; later calls return immediately.
    pub async fn registered(&mut self) -> Result<(), ProtocolError> {
        match self.handshake.take() {
            Some(handle) => handle
                .await
                .unwrap_or(Err(ProtocolError::Transport(TransportError::Disposed))),
            None => Ok(()),
        }
    }

    /// Send one raw line, without CRLF.
    pub async fn send_line(&self, line: impl Into<String>) -> Result<(), ProtocolError> {
        self.send_lines(vec![line.into()]).await
    }

    /// Send `lines` as one batch. Either all of them reach the transport
    /// or the call fails.
    pub async fn send_lines(&self, lines: Vec<String>) -> Result<(), ProtocolError> {
        Ok(completed(submit(&self.requests, lines)).await?)
    }

    /// Send a command in its canonical form.
    pub async fn send_command(&self, command: &Command) -> Result<(), ProtocolError> {
        self.send_line(command.to_string()).await
    }

    /// Join `channel`, normalizing its name first.
    ///
    /// Joining a channel already in the set sends nothing and returns
    /// [`Membership::Unchanged`]. A failed send leaves the set as it was.
    pub async fn join(&self, channel: &str) -> Result<Membership, ProtocolError> {
        let channel = channels::normalize(channel)?;
        if self.channels.insert(&channel) == Membership::Unchanged {
            return Ok(Membership::Unchanged);
        }
        debug!(%channel, "joining");
        if let Err(e) = self.send_line(format!("JOIN {}", channel)).await {
            self.channels.remove(&channel);
            return Err(e);
        }
        Ok(Membership::Changed)
    }

    /// Leave `channel`. The counterpart of [`Client::join`].
    pub async fn part(&self, channel: &str) -> Result<Membership, ProtocolError> {
        let channel = channels::normalize(channel)?;
        if self.channels.remove(&channel) == Membership::Unchanged {
            return Ok(Membership::Unchanged);
        }
        debug!(%channel, "parting");
        if let Err(e) = self.send_line(format!("PART {}", channel)).await {
            self.channels.insert(&channel);
            return Err(e);
        }
        Ok(Membership::Changed)
    }

    /// The joined channels, sorted by name.
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.snapshot()
    }

    /// Whether `channel` (normalized) is joined.
    pub fn is_joined(&self, channel: &str) -> bool {
        channels::normalize(channel)
            .map(|c| self.channels.contains(&c))
            .unwrap_or(false)
    }

    /// Close the transport. Sends queued before this call are flushed
    /// first; anything sent afterwards fails with
    /// [`TransportError::Disposed`].
    pub async fn dispose(&self) {
        let (done, finished) = oneshot::channel();
        if self.requests.send(Request::Dispose { done }).is_ok() {
            let _ = finished.await;
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let (done, _) = oneshot::channel();
        let _ = self.requests.send(Request::Dispose { done });
    }
}

type Completion = oneshot::Receiver<Result<(), TransportError>>;

/// Queue `lines` for the driver. The send happens in queue order whether
/// or not the returned completion is awaited.
fn submit(requests: &mpsc::UnboundedSender<Request>, lines: Vec<String>) -> Completion {
    let (done, sent) = oneshot::channel();
    // If the driver is gone the request, and `done` with it, is dropped
    // here, which `completed` reports as `Disposed`.
    let _ = requests.send(Request::Send { lines, done });
    sent
}

async fn completed(sent: Completion) -> Result<(), TransportError> {
    sent.await.unwrap_or(Err(TransportError::Disposed))
}

async fn register(
    mut machine: HandshakeMachine,
    requests: mpsc::UnboundedSender<Request>,
) -> Result<(), ProtocolError> {
    let mut detached = Vec::new();
    while let Some(step) = machine.advance() {
        debug!(state = ?machine.state(), lines = step.lines.len(), "handshake step");
        let sent = submit(&requests, step.lines);
        if step.await_completion {
            completed(sent).await?;
        } else {
            detached.push(sent);
        }
    }
    for sent in detached {
        if let Err(e) = completed(sent).await {
            warn!(error = %e, "handshake send failed");
            return Err(e.into());
        }
    }
    debug!("handshake sent");
    Ok(())
}

/// Inbound commands, in arrival order.
///
/// Ends when the connection closes. A transport failure is yielded as the
/// final item.
#[derive(Debug)]
pub struct CommandStream {
    inbound: mpsc::Receiver<Inbound>,
}

impl CommandStream {
    /// The next command, or `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<Inbound> {
        self.inbound.recv().await
    }
}

impl Stream for CommandStream {
    type Item = Inbound;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inbound.poll_recv(cx)
    }
}

/// What one turn of the driver loop produced.
enum Event {
    Request(Option<Request>),
    Chunk(Option<String>),
    Failed(TransportError),
}

struct Driver<T> {
    transport: T,
    requests: mpsc::UnboundedReceiver<Request>,
    inbound: mpsc::Sender<Inbound>,
    policy: ParseErrorPolicy,
}

impl<T: Transport> Driver<T> {
    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                request = self.requests.recv() => Event::Request(request),
                received = self.transport.receive() => match received {
                    Ok(chunk) => Event::Chunk(chunk),
                    Err(e) => Event::Failed(e),
                },
            };

            match event {
                Event::Request(Some(Request::Send { lines, done })) => {
                    for line in &lines {
                        trace!(line = %line, "<<");
                    }
                    let result = self.transport.send(&lines).await;
                    if let Err(e) = &result {
                        warn!(error = %e, "send failed");
                    }
                    let _ = done.send(result);
                }
                Event::Request(Some(Request::Dispose { done })) => {
                    self.dispose().await;
                    let _ = done.send(());
                    break;
                }
                Event::Request(None) => {
                    self.dispose().await;
                    break;
                }
                Event::Chunk(Some(chunk)) => self.dispatch(&chunk).await,
                Event::Chunk(None) => {
                    debug!("connection closed by server");
                    break;
                }
                Event::Failed(e) => {
                    warn!(error = %e, "receive failed");
                    let _ = self.inbound.send(Err(e.into())).await;
                    break;
                }
            }
        }
        // Dropping `requests` fails every queued send with `Disposed`.
        debug!("driver stopped");
    }

    async fn dispatch(&mut self, chunk: &str) {
        let items: Vec<Inbound> = Batch::new(chunk, self.policy).collect();
        let pongs: Vec<String> = items
            .iter()
            .filter_map(|item| item.as_ref().ok())
            .filter_map(keepalive::respond)
            .collect();

        let Self {
            transport, inbound, ..
        } = self;
        // Pongs go out while the chunk is delivered, so a consumer that
        // is slow to read never holds them back.
        let answer = async {
            if !pongs.is_empty() {
                if let Err(e) = transport.send(&pongs).await {
                    warn!(error = %e, "failed to answer ping");
                }
            }
        };
        let deliver = async {
            for item in items {
                if let Ok(command) = &item {
                    trace!(command = %command, ">>");
                }
                // A closed stream only means nobody is listening.
                let _ = inbound.send(item).await;
            }
        };
        tokio::join!(answer, deliver);
    }

    async fn dispose(&mut self) {
        debug!("disposing transport");
        if let Err(e) = self.transport.dispose().await {
            warn!(error = %e, "dispose failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records sends; inbound chunks come from a channel the test feeds.
    struct MockTransport {
        sent: Arc<Mutex<Vec<String>>>,
        chunks: mpsc::UnboundedReceiver<String>,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn receive(&mut self) -> Result<Option<String>, TransportError> {
            Ok(self.chunks.recv().await)
        }

        async fn send(&mut self, lines: &[String]) -> Result<(), TransportError> {
            self.sent.lock().unwrap().extend(lines.iter().cloned());
            Ok(())
        }

        async fn dispose(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn mock() -> (
        MockTransport,
        Arc<Mutex<Vec<String>>>,
        mpsc::UnboundedSender<String>,
    ) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = MockTransport {
            sent: sent.clone(),
            chunks: rx,
        };
        (transport, sent, tx)
    }

    #[test]
    fn test_twitch_preset() {
        let config = ClientConfig::twitch();
        assert_eq!(config.handshake.nickname, "justinfan12345");
        assert_eq!(config.handshake.password.as_deref(), Some("SCHMOOPIE"));
        assert_eq!(config.handshake.capabilities.len(), 3);
        assert!(matches!(
            config.endpoint,
            Some(Endpoint::WebSocket { ref url }) if url == TWITCH_WEBSOCKET_URL
        ));
    }

    #[tokio::test]
    async fn test_missing_nickname_rejected() {
        let (transport, _, _) = mock();
        let err = Client::with_transport(ClientConfig::new(""), transport).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingNickname);
    }

    #[tokio::test]
    async fn test_connect_without_endpoint() {
        let err = Client::connect(ClientConfig::new("n")).await.unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Configuration(ConfigurationError::MissingTransport)
        ));
    }

    #[tokio::test]
    async fn test_handshake_then_join() {
        let (transport, sent, _chunks) = mock();
        let (mut client, _commands) =
            Client::with_transport(ClientConfig::new("bot"), transport).unwrap();
        client.registered().await.unwrap();

        assert_eq!(client.join("Rust").await.unwrap(), Membership::Changed);
        assert_eq!(client.join("#rust").await.unwrap(), Membership::Unchanged);
        assert!(client.is_joined("#RUST"));

        assert_eq!(
            *sent.lock().unwrap(),
            ["NICK bot", "USER bot 0 * :bot", "JOIN #rust"]
        );
    }

    #[tokio::test]
    async fn test_ping_answered_and_delivered() {
        let (transport, sent, chunks) = mock();
        let (mut client, mut commands) =
            Client::with_transport(ClientConfig::new("bot"), transport).unwrap();
        client.registered().await.unwrap();

        chunks.send("PING :tmi.twitch.tv\r\n".to_owned()).unwrap();
        let command = commands.recv().await.unwrap().unwrap();
        assert!(matches!(command, Command::Ping { ref host, .. } if host == "tmi.twitch.tv"));

        // A later send is queued behind the pong.
        client.send_line("PING :me").await.unwrap();
        let sent = sent.lock().unwrap();
        assert_eq!(sent[sent.len() - 2..], ["PONG :tmi.twitch.tv", "PING :me"]);
    }

    #[tokio::test]
    async fn test_send_after_dispose_fails() {
        let (transport, _, _chunks) = mock();
        let (client, _commands) =
            Client::with_transport(ClientConfig::new("bot"), transport).unwrap();
        client.dispose().await;
        let err = client.send_line("PING :x").await.unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::Transport(TransportError::Disposed)
        ));
    }

    #[tokio::test]
    async fn test_stream_ends_when_server_closes() {
        let (transport, _, chunks) = mock();
        let (_client, mut commands) =
            Client::with_transport(ClientConfig::new("bot"), transport).unwrap();
        drop(chunks);
        assert!(commands.recv().await.is_none());
    }
}
