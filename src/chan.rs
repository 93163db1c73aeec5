//! Channel names.
//!
//! # Reference
//! - RFC 2812 Section 1.3: Channel names

use std::fmt;
use std::str::FromStr;

use crate::error::ValueParseError;
use crate::message::nom_parser;

/// The leading marker of a channel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelPrefix {
    /// `#` network-wide channel.
    Network,
    /// `+` channel without modes.
    Modeless,
    /// `&` server-local channel.
    Local,
    /// `!` safe channel with its five-character id.
    Safe(String),
}

impl fmt::Display for ChannelPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelPrefix::Network => f.write_str("#"),
            ChannelPrefix::Modeless => f.write_str("+"),
            ChannelPrefix::Local => f.write_str("&"),
            ChannelPrefix::Safe(id) => write!(f, "!{}", id),
        }
    }
}

/// A validated channel name such as `#rust`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    prefix: ChannelPrefix,
    name: String,
}

impl Channel {
    pub(crate) fn from_parts(prefix: ChannelPrefix, name: &str) -> Self {
        Self {
            prefix,
            name: name.to_owned(),
        }
    }

    /// The channel prefix.
    pub fn prefix(&self) -> &ChannelPrefix {
        &self.prefix
    }

    /// The name after the prefix.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.name)
    }
}

impl FromStr for Channel {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        nom_parser::complete(nom_parser::channel, s)
            .ok_or_else(|| ValueParseError::Channel(s.to_owned()))
    }
}

/// Extension trait for checking if a string is a valid IRC channel name.
pub trait ChannelExt {
    /// Check if this string matches the channel grammar in full.
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for &str {
    fn is_channel_name(&self) -> bool {
        self.parse::<Channel>().is_ok()
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_channels() {
        assert!("#channel".is_channel_name());
        assert!("&local".is_channel_name());
        assert!("+modeless".is_channel_name());
        assert!("!AB12Csafe".is_channel_name());
    }

    #[test]
    fn test_invalid_channels() {
        assert!(!"channel".is_channel_name()); // no prefix
        assert!(!"#chan nel".is_channel_name()); // space
        assert!(!"#chan,nel".is_channel_name()); // comma
        assert!(!"#chan:nel".is_channel_name()); // colon
        assert!(!"!abcdesafe".is_channel_name()); // lowercase safe id
        assert!(!"".is_channel_name());
    }

    #[test]
    fn test_parts_and_display() {
        let chan: Channel = "!ABCDEfoo".parse().unwrap();
        assert_eq!(chan.prefix(), &ChannelPrefix::Safe("ABCDE".into()));
        assert_eq!(chan.name(), "foo");
        assert_eq!(chan.to_string(), "!ABCDEfoo");

        let chan: Channel = "#foo".parse().unwrap();
        assert_eq!(chan.prefix(), &ChannelPrefix::Network);
        assert_eq!(chan.to_string(), "#foo");
    }
}
