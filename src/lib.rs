//! # slirc-client
//!
//! A client-side protocol engine for IRCv3 and Twitch TMI.
//!
//! ## Features
//!
//! - Strict line grammar with byte-offset parse errors
//! - IRCv3 message tags, kept as received and unescaped on demand
//! - Typed commands, with malformed lines surfaced instead of dropped
//! - Sans-IO registration handshake (`CAP REQ`, `PASS`, `NICK`, `USER`)
//! - Optional Tokio client with TCP, TLS and WebSocket transports

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Parsing lines
//!
//! ```rust
//! use slirc_client::{Command, Target};
//!
//! let raw = "@badge-info=;color=#FF0000 :ronni!ronni@ronni.tmi.twitch.tv PRIVMSG #dallas :Kappa Keepo\r\n";
//! let command = Command::from_line(raw);
//!
//! if let Command::Privmsg { target, text, message, .. } = &command {
//!     assert!(matches!(target, Target::Channel(_)));
//!     assert_eq!(text, "Kappa Keepo");
//!     assert_eq!(message.tag_value("color"), Some("#FF0000"));
//! }
//! ```
//!
//! ### Building messages
//!
//! ```rust
//! use slirc_client::Message;
//!
//! let msg = Message::new("PRIVMSG")
//!     .with_tag("+example.com/typing", Some("active now"))
//!     .with_param("#rust")
//!     .with_trailing("hello world");
//! assert_eq!(
//!     msg.to_string(),
//!     "@+example.com/typing=active\\snow PRIVMSG #rust :hello world"
//! );
//! ```

pub mod batch;
pub mod caps;
pub mod chan;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod keepalive;
pub mod message;
pub mod prefix;
pub mod state;
pub mod user;

#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod channels;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod client;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod transport;

pub use self::batch::{parse_batch, ParseErrorPolicy};
pub use self::caps::Capability;
pub use self::chan::{Channel, ChannelExt, ChannelPrefix};
pub use self::command::{materialize, Command, Origin, Target};
pub use self::error::{
    ConfigurationError, LineError, LineParseError, ProtocolError, Result, SemanticCommandError,
    ValueParseError,
};
pub use self::message::{parse, CommandDraft, Message, TagKey};
pub use self::prefix::Prefix;
pub use self::state::{HandshakeConfig, HandshakeMachine, HandshakeState, HandshakeStep};
pub use self::user::User;

#[cfg(feature = "tokio")]
pub use self::channels::Membership;
#[cfg(feature = "tokio")]
pub use self::client::{Client, ClientConfig, CommandStream, Endpoint};
#[cfg(feature = "tokio")]
pub use self::transport::{
    LineCodec, TcpTransport, Transport, TransportError, WebSocketTransport, MAX_IRC_LINE_LEN,
};
