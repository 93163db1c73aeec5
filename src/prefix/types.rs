//! IRC message prefix types.
//!
//! A prefix identifies the origin of a message: either a server name or a
//! user's `nick[!user]@host` mask.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::str::FromStr;

use crate::error::ValueParseError;
use crate::message::nom_parser;
use crate::user::User;

/// IRC message prefix - identifies the origin of a message.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prefix {
    /// Server name or IPv4 address (e.g. "irc.example.com").
    Server {
        /// The server name.
        name: String,
    },
    /// User mask.
    Nickname {
        /// Nickname.
        nick: String,
        /// Username, only present together with a host.
        user: Option<String>,
        /// Hostname.
        host: Option<String>,
    },
}

impl Prefix {
    /// Create a full `nick!user@host` prefix.
    ///
    /// # Example
    ///
    /// ```
    /// use slirc_client::Prefix;
    ///
    /// let prefix = Prefix::new("nick", "user", "host.example.com");
    /// assert_eq!(prefix.nick(), Some("nick"));
    /// assert_eq!(prefix.user(), Some("user"));
    /// assert_eq!(prefix.host(), Some("host.example.com"));
    /// ```
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Prefix::Nickname {
            nick: nick.into(),
            user: Some(user.into()),
            host: Some(host.into()),
        }
    }

    /// Create a server prefix.
    pub fn server(name: impl Into<String>) -> Self {
        Prefix::Server { name: name.into() }
    }

    /// Get the nickname if this is a user prefix.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Prefix::Nickname { nick, .. } => Some(nick),
            Prefix::Server { .. } => None,
        }
    }

    /// Get the username if this is a user prefix.
    pub fn user(&self) -> Option<&str> {
        match self {
            Prefix::Nickname { user, .. } => user.as_deref(),
            Prefix::Server { .. } => None,
        }
    }

    /// Get the hostname. For server prefixes this is the server name.
    pub fn host(&self) -> Option<&str> {
        match self {
            Prefix::Server { name } => Some(name),
            Prefix::Nickname { host, .. } => host.as_deref(),
        }
    }

    /// The user this prefix names, if it is a user prefix.
    pub fn to_user(&self) -> Option<User> {
        match self {
            Prefix::Nickname { nick, user, host } => {
                Some(User::with_mask(nick.clone(), user.clone(), host.clone()))
            }
            Prefix::Server { .. } => None,
        }
    }
}

impl FromStr for Prefix {
    type Err = ValueParseError;

    /// Parse a prefix with the same server-then-nickname backtracking the
    /// line parser uses, requiring the whole string to match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        nom_parser::complete(nom_parser::standalone_prefix, s)
            .ok_or_else(|| ValueParseError::Prefix(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server() {
        assert_eq!(
            "irc.example.com".parse::<Prefix>().unwrap(),
            Prefix::server("irc.example.com")
        );
    }

    #[test]
    fn test_parse_nickname() {
        assert_eq!(
            "nick!user@host".parse::<Prefix>().unwrap(),
            Prefix::new("nick", "user", "host")
        );
        assert_eq!(
            "nick@host".parse::<Prefix>().unwrap(),
            Prefix::Nickname {
                nick: "nick".into(),
                user: None,
                host: Some("host".into()),
            }
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!("server.com!bob".parse::<Prefix>().is_err());
        assert!("".parse::<Prefix>().is_err());
        assert!("nick!user".parse::<Prefix>().is_err());
    }

    #[test]
    fn test_accessors() {
        let server = Prefix::server("irc.test");
        assert_eq!(server.nick(), None);
        assert_eq!(server.host(), Some("irc.test"));

        let user = Prefix::new("a", "b", "c");
        assert_eq!(user.to_user().unwrap().nickname(), "a");
        assert!(server.to_user().is_none());
    }
}
