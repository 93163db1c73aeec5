//! IRC command types.
//!
//! Every variant embeds the [`Message`] it was classified from, so tags,
//! prefix and raw parameters stay reachable next to the typed fields.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Twitch IRC: <https://dev.twitch.tv/docs/irc/>

use std::collections::BTreeMap;
use std::fmt;

use crate::chan::Channel;
use crate::error::LineError;
use crate::message::{Message, TagKey};
use crate::prefix::Prefix;
use crate::user::User;

/// The destination of a PRIVMSG or NOTICE.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// A channel.
    Channel(Channel),
    /// A single user.
    User(User),
}

impl Target {
    /// Resolve a target parameter: a full channel-grammar match is a
    /// channel, anything else is a user.
    pub fn resolve(param: &str) -> Target {
        match param.parse::<Channel>() {
            Ok(channel) => Target::Channel(channel),
            Err(_) => Target::User(User::new(param)),
        }
    }

    /// The channel, if this is a channel target.
    pub fn channel(&self) -> Option<&Channel> {
        match self {
            Target::Channel(channel) => Some(channel),
            Target::User(_) => None,
        }
    }

    /// The user, if this is a user target.
    pub fn user(&self) -> Option<&User> {
        match self {
            Target::User(user) => Some(user),
            Target::Channel(_) => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Channel(channel) => fmt::Display::fmt(channel, f),
            Target::User(user) => f.write_str(user.nickname()),
        }
    }
}

/// Which network extension a command belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum Origin {
    /// Twitch TMI.
    Twitch,
}

/// A classified IRC line.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// `PRIVMSG target :text`, possibly a CTCP ACTION.
    Privmsg {
        /// The underlying message.
        message: Message,
        /// Channel or user addressed.
        target: Target,
        /// Visible text, with any ACTION wrapping removed.
        text: String,
        /// Whether the text was a CTCP ACTION.
        is_action: bool,
    },
    /// `NOTICE target :text`
    Notice {
        /// The underlying message.
        message: Message,
        /// Channel or user addressed.
        target: Target,
        /// Notice text.
        text: String,
    },
    /// Twitch `WHISPER user :text`
    Whisper {
        /// The underlying message.
        message: Message,
        /// Recipient.
        target: User,
        /// Whisper text.
        text: String,
        /// Always [`Origin::Twitch`].
        origin: Origin,
    },
    /// `SQUERY service :text`
    Squery {
        /// The underlying message.
        message: Message,
        /// Service addressed.
        target: User,
        /// Query text.
        text: String,
    },
    /// `JOIN channel`
    Join {
        /// The underlying message.
        message: Message,
        /// Channel joined.
        channel: Channel,
    },
    /// `PART channel`
    Part {
        /// The underlying message.
        message: Message,
        /// Channel left.
        channel: Channel,
    },
    /// `MODE channel [modes]`
    Mode {
        /// The underlying message.
        message: Message,
        /// Channel whose modes change.
        channel: Channel,
        /// Mode string and arguments, unparsed.
        modes: Vec<String>,
    },
    /// `TOPIC channel [:topic]`
    Topic {
        /// The underlying message.
        message: Message,
        /// Channel.
        channel: Channel,
        /// New topic, absent for a query.
        topic: Option<String>,
    },
    /// `NICK nickname`
    Nick {
        /// The underlying message.
        message: Message,
        /// New nickname.
        nickname: String,
    },
    /// `INVITE user channel`
    Invite {
        /// The underlying message.
        message: Message,
        /// User invited.
        user: User,
        /// Channel invited to.
        channel: Channel,
    },
    /// `KICK channels users [:comment]`
    Kick {
        /// The underlying message.
        message: Message,
        /// Channels, from the comma-separated first parameter.
        channels: Vec<Channel>,
        /// Users, from the comma-separated second parameter.
        users: Vec<User>,
        /// Kick reason.
        comment: Option<String>,
    },
    /// `PING :host`
    Ping {
        /// The underlying message.
        message: Message,
        /// Token to echo back.
        host: String,
    },
    /// `PONG :host`
    Pong {
        /// The underlying message.
        message: Message,
        /// Echoed token.
        host: String,
    },
    /// `ERROR :message`
    Error {
        /// The underlying message.
        message: Message,
        /// Error text.
        text: String,
    },
    /// `QUIT :message`
    Quit {
        /// The underlying message.
        message: Message,
        /// Quit reason.
        text: String,
    },
    /// A three-digit server reply.
    NumericReply {
        /// The underlying message.
        message: Message,
        /// The reply code, e.g. `1` for `001`.
        code: u16,
    },
    /// Any other alphabetic verb.
    Generic {
        /// The underlying message.
        message: Message,
    },
    /// A line that failed parsing or classification.
    Invalid {
        /// The line as received.
        raw_line: String,
        /// The parsed message, when the failure was semantic.
        message: Option<Message>,
        /// What went wrong.
        #[cfg_attr(feature = "serde", serde(skip, default = "invalid_placeholder"))]
        error: LineError,
    },
}

#[cfg(feature = "serde")]
fn invalid_placeholder() -> LineError {
    LineError::Parse(crate::error::LineParseError::new("", 0))
}

impl Command {
    /// The underlying message. `None` only for lines that failed the grammar.
    pub fn message(&self) -> Option<&Message> {
        match self {
            Command::Privmsg { message, .. }
            | Command::Notice { message, .. }
            | Command::Whisper { message, .. }
            | Command::Squery { message, .. }
            | Command::Join { message, .. }
            | Command::Part { message, .. }
            | Command::Mode { message, .. }
            | Command::Topic { message, .. }
            | Command::Nick { message, .. }
            | Command::Invite { message, .. }
            | Command::Kick { message, .. }
            | Command::Ping { message, .. }
            | Command::Pong { message, .. }
            | Command::Error { message, .. }
            | Command::Quit { message, .. }
            | Command::NumericReply { message, .. }
            | Command::Generic { message } => Some(message),
            Command::Invalid { message, .. } => message.as_ref(),
        }
    }

    /// The verb as sent.
    pub fn verb(&self) -> Option<&str> {
        self.message().map(Message::verb)
    }

    /// The message prefix.
    pub fn prefix(&self) -> Option<&Prefix> {
        self.message().and_then(Message::prefix)
    }

    /// The message tags. `None` only for lines that failed the grammar.
    pub fn tags(&self) -> Option<&BTreeMap<TagKey, Option<String>>> {
        self.message().map(Message::tags)
    }

    /// Whether this is an [`Command::Invalid`] placeholder.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Command::Invalid { .. })
    }

    /// The failure, for invalid commands.
    pub fn error(&self) -> Option<&LineError> {
        match self {
            Command::Invalid { error, .. } => Some(error),
            _ => None,
        }
    }
}
