//! Client tests against an in-memory transport.

#![cfg(feature = "tokio")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use slirc_client::{
    Client, ClientConfig, Command, ConfigurationError, HandshakeConfig, Membership,
    ParseErrorPolicy, ProtocolError, TcpTransport, Transport, TransportError,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[derive(Clone, Default)]
struct Wire {
    sent: Arc<Mutex<Vec<String>>>,
    /// Lines starting with this fail to send.
    fail_prefix: Arc<Mutex<Option<String>>>,
}

impl Wire {
    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn fail_on(&self, prefix: &str) {
        *self.fail_prefix.lock().unwrap() = Some(prefix.to_string());
    }
}

struct MemoryTransport {
    wire: Wire,
    inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn receive(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.inbound.recv().await)
    }

    async fn send(&mut self, lines: &[String]) -> Result<(), TransportError> {
        let fail = self.wire.fail_prefix.lock().unwrap().clone();
        if let Some(prefix) = fail {
            if lines.iter().any(|l| l.starts_with(&prefix)) {
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "refused",
                )));
            }
        }
        self.wire.sent.lock().unwrap().extend(lines.iter().cloned());
        Ok(())
    }

    async fn dispose(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

fn memory() -> (MemoryTransport, Wire, mpsc::UnboundedSender<String>) {
    let wire = Wire::default();
    let (tx, rx) = mpsc::unbounded_channel();
    let transport = MemoryTransport {
        wire: wire.clone(),
        inbound: rx,
    };
    (transport, wire, tx)
}

#[tokio::test]
async fn test_handshake_order_with_password() {
    let handshake = HandshakeConfig::new("n")
        .with_password("pw")
        .with_capabilities(["a/b"])
        .unwrap();
    let (transport, wire, _server) = memory();
    let (mut client, _commands) =
        Client::with_transport(ClientConfig::from_handshake(handshake), transport).unwrap();
    client.registered().await.unwrap();

    assert_eq!(
        wire.sent(),
        ["CAP REQ :a/b", "PASS pw", "NICK n", "USER n 0 * :n"]
    );
}

#[tokio::test]
async fn test_user_modes_in_handshake() {
    let handshake = HandshakeConfig {
        invisible: true,
        receive_wallops: true,
        ..HandshakeConfig::new("n").with_realname("Real Name")
    };
    let (transport, wire, _server) = memory();
    let (mut client, _commands) =
        Client::with_transport(ClientConfig::from_handshake(handshake), transport).unwrap();
    client.registered().await.unwrap();

    assert_eq!(wire.sent(), ["NICK n", "USER n 12 * :Real Name"]);
}

#[tokio::test]
async fn test_missing_nickname_is_fatal() {
    let (transport, wire, _server) = memory();
    let err = Client::with_transport(ClientConfig::new(""), transport).unwrap_err();
    assert_eq!(err, ConfigurationError::MissingNickname);
    assert!(wire.sent().is_empty());
}

#[tokio::test]
async fn test_join_part_idempotence() {
    let (transport, wire, _server) = memory();
    let (mut client, _commands) =
        Client::with_transport(ClientConfig::new("n"), transport).unwrap();
    client.registered().await.unwrap();

    assert_eq!(client.join("#foo").await.unwrap(), Membership::Changed);
    assert_eq!(client.join("FOO").await.unwrap(), Membership::Unchanged);
    assert_eq!(client.part("#bar").await.unwrap(), Membership::Unchanged);
    assert_eq!(client.part("#Foo").await.unwrap(), Membership::Changed);
    assert!(client.channels().is_empty());

    assert_eq!(
        wire.sent()[2..],
        ["JOIN #foo".to_string(), "PART #foo".to_string()]
    );
}

#[tokio::test]
async fn test_join_sends_name_unfolded() {
    let (transport, wire, _server) = memory();
    let (mut client, _commands) =
        Client::with_transport(ClientConfig::new("n"), transport).unwrap();
    client.registered().await.unwrap();

    assert_eq!(client.join("#[X]").await.unwrap(), Membership::Changed);
    assert_eq!(client.join("#{x}").await.unwrap(), Membership::Unchanged);
    assert!(client.is_joined("#{X}"));
    assert_eq!(wire.sent()[2..], ["JOIN #[x]".to_string()]);
}

#[tokio::test]
async fn test_failed_join_rolls_back() {
    let (transport, wire, _server) = memory();
    let (mut client, _commands) =
        Client::with_transport(ClientConfig::new("n"), transport).unwrap();
    client.registered().await.unwrap();

    wire.fail_on("JOIN");
    let err = client.join("#foo").await.unwrap_err();
    assert!(matches!(err, ProtocolError::Transport(TransportError::Io(_))));
    assert!(!client.is_joined("#foo"));
}

#[tokio::test]
async fn test_invalid_channel_name() {
    let (transport, _wire, _server) = memory();
    let (client, _commands) = Client::with_transport(ClientConfig::new("n"), transport).unwrap();
    let err = client.join("has space").await.unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidValue(_)));
}

#[tokio::test]
async fn test_ping_gets_pong() {
    let (transport, wire, server) = memory();
    let (mut client, mut commands) =
        Client::with_transport(ClientConfig::new("n"), transport).unwrap();
    client.registered().await.unwrap();

    server
        .send(":tmi.twitch.tv PRIVMSG #c :hi\r\nPING :tmi.twitch.tv\r\n".to_string())
        .unwrap();
    assert!(matches!(
        commands.next().await,
        Some(Ok(Command::Privmsg { .. }))
    ));
    assert!(matches!(
        commands.next().await,
        Some(Ok(Command::Ping { .. }))
    ));

    // Queued behind the pong on the same driver.
    client.send_line("NOOP").await.unwrap();
    let sent = wire.sent();
    assert_eq!(sent[sent.len() - 2..], ["PONG :tmi.twitch.tv", "NOOP"]);
}

#[tokio::test]
async fn test_ping_answered_while_consumer_lags() {
    let (transport, wire, server) = memory();
    let config = ClientConfig::new("n").with_inbound_capacity(1);
    let (mut client, _commands) = Client::with_transport(config, transport).unwrap();
    client.registered().await.unwrap();

    server
        .send("PRIVMSG #c :one\r\nPRIVMSG #c :two\r\nPING :keep\r\n".to_string())
        .unwrap();

    // Nothing reads `_commands`; the inbound queue fills after one line.
    let mut answered = false;
    for _ in 0..100 {
        if wire.sent().iter().any(|line| line == "PONG :keep") {
            answered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(answered, "sent: {:?}", wire.sent());
}

#[tokio::test]
async fn test_bad_bytes_do_not_end_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        socket
            .write_all(b"PRIVMSG #a :ding\x07\r\nPRIVMSG #a :caf\xe9\r\nPING :after\r\n")
            .await
            .unwrap();
        // Hold the connection open until the client hangs up.
        let mut buf = [0u8; 512];
        while let Ok(n) = socket.read(&mut buf).await {
            if n == 0 {
                break;
            }
        }
    });

    let transport = TcpTransport::connect("127.0.0.1", port, false).await.unwrap();
    let (client, mut commands) =
        Client::with_transport(ClientConfig::new("n"), transport).unwrap();

    match commands.next().await {
        Some(Ok(Command::Privmsg { text, .. })) => assert_eq!(text, "ding\x07"),
        other => panic!("unexpected {:?}", other),
    }
    match commands.next().await {
        Some(Ok(Command::Privmsg { text, .. })) => assert_eq!(text, "caf\u{FFFD}"),
        other => panic!("unexpected {:?}", other),
    }
    match commands.next().await {
        Some(Ok(Command::Ping { host, .. })) => assert_eq!(host, "after"),
        other => panic!("unexpected {:?}", other),
    }

    client.dispose().await;
    server.await.unwrap();
}

#[tokio::test]
async fn test_suppress_skips_only_bad_line() {
    let (transport, _wire, server) = memory();
    let config = ClientConfig::new("n").with_parse_errors(ParseErrorPolicy::Suppress);
    let (_client, commands) = Client::with_transport(config, transport).unwrap();

    server
        .send("PONG :a\r\n!bad\r\nPONG :b\r\n".to_string())
        .unwrap();
    drop(server);

    let hosts: Vec<String> = commands
        .map(|c| match c.unwrap() {
            Command::Pong { host, .. } => host,
            other => panic!("unexpected {:?}", other),
        })
        .collect()
        .await;
    assert_eq!(hosts, ["a", "b"]);
}

#[tokio::test]
async fn test_propagate_halts_batch() {
    let (transport, _wire, server) = memory();
    let config = ClientConfig::new("n").with_parse_errors(ParseErrorPolicy::Propagate);
    let (_client, mut commands) = Client::with_transport(config, transport).unwrap();

    server
        .send("PONG :a\r\n!bad\r\nPONG :b\r\n".to_string())
        .unwrap();
    server.send("PONG :c\r\n".to_string()).unwrap();
    drop(server);

    let items: Vec<_> = commands.by_ref().collect().await;
    assert_eq!(items.len(), 3);
    assert!(matches!(&items[0], Ok(Command::Pong { host, .. }) if host == "a"));
    assert!(matches!(&items[1], Err(ProtocolError::Parse(e)) if e.raw_line == "!bad"));
    assert!(matches!(&items[2], Ok(Command::Pong { host, .. }) if host == "c"));
}

#[tokio::test]
async fn test_emit_delivers_invalid_in_place() {
    let (transport, _wire, server) = memory();
    let (_client, commands) = Client::with_transport(ClientConfig::new("n"), transport).unwrap();

    server
        .send("PONG :a\r\nJOIN nochannel\r\n".to_string())
        .unwrap();
    drop(server);

    let items: Vec<_> = commands.collect().await;
    assert_eq!(items.len(), 2);
    assert!(matches!(&items[1], Ok(c) if c.is_invalid()));
}

#[tokio::test]
async fn test_dispose_fails_later_sends() {
    let (transport, _wire, _server) = memory();
    let (mut client, mut commands) =
        Client::with_transport(ClientConfig::new("n"), transport).unwrap();
    client.registered().await.unwrap();

    client.dispose().await;
    let err = client.send_line("PING :x").await.unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::Transport(TransportError::Disposed)
    ));
    assert!(commands.next().await.is_none());
}

#[tokio::test]
async fn test_receive_failure_ends_stream() {
    struct Broken;

    #[async_trait]
    impl Transport for Broken {
        async fn receive(&mut self) -> Result<Option<String>, TransportError> {
            Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            )))
        }

        async fn send(&mut self, _: &[String]) -> Result<(), TransportError> {
            Ok(())
        }

        async fn dispose(&mut self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    let (_client, mut commands) = Client::with_transport(ClientConfig::new("n"), Broken).unwrap();
    assert!(matches!(
        commands.next().await,
        Some(Err(ProtocolError::Transport(TransportError::Io(_))))
    ));
    assert!(commands.next().await.is_none());
}
