//! IRCv3 capability names.
//!
//! A capability is a feature the client asks the server to enable with
//! `CAP REQ`. Capabilities may be namespaced by a vendor, as Twitch does with
//! `twitch.tv/tags`.
//!
//! # Reference
//! - IRCv3 Capability Negotiation: <https://ircv3.net/specs/extensions/capability-negotiation>
//! - Twitch IRC capabilities: <https://dev.twitch.tv/docs/irc/capabilities>

use std::fmt;
use std::str::FromStr;

use crate::error::ValueParseError;
use crate::message::nom_parser;

/// A `[vendor/]name` capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Capability {
    vendor: Option<String>,
    name: String,
}

impl Capability {
    /// Twitch message tags (`twitch.tv/tags`).
    pub const TWITCH_TAGS: &'static str = "twitch.tv/tags";
    /// Twitch JOIN/PART membership events (`twitch.tv/membership`).
    pub const TWITCH_MEMBERSHIP: &'static str = "twitch.tv/membership";
    /// Twitch-specific commands (`twitch.tv/commands`).
    pub const TWITCH_COMMANDS: &'static str = "twitch.tv/commands";

    /// A capability without a vendor namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            vendor: None,
            name: name.into(),
        }
    }

    /// A capability with an optional vendor namespace.
    pub fn with_vendor(vendor: Option<String>, name: impl Into<String>) -> Self {
        Self {
            vendor,
            name: name.into(),
        }
    }

    /// The vendor namespace, e.g. `twitch.tv`.
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    /// The capability name without its vendor.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The three capabilities Twitch chat clients request.
    pub fn twitch() -> Vec<Capability> {
        [
            Self::TWITCH_TAGS,
            Self::TWITCH_MEMBERSHIP,
            Self::TWITCH_COMMANDS,
        ]
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(vendor) = &self.vendor {
            write!(f, "{}/", vendor)?;
        }
        f.write_str(&self.name)
    }
}

impl FromStr for Capability {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        nom_parser::complete(nom_parser::capability, s)
            .ok_or_else(|| ValueParseError::Capability(s.to_owned()))
    }
}

impl TryFrom<String> for Capability {
    type Error = ValueParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Capability> for String {
    fn from(cap: Capability) -> Self {
        cap.to_string()
    }
}
