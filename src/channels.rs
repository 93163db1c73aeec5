//! The set of channels the client has joined.
//!
//! Names are normalized before they are sent: a `#` is prepended when the
//! name has no channel prefix, and the name is lowercased, so `Rust`,
//! `#rust` and `#RUST` are the same channel. The set itself is keyed by the
//! rfc1459 fold, which also treats `#[x]` and `#{x}` as one channel.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::chan::{Channel, ChannelExt};
use crate::error::ValueParseError;

/// Whether a join or part changed the set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    /// The channel was added or removed.
    Changed,
    /// The channel was already in, or already absent from, the set.
    Unchanged,
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
///
/// In addition to ASCII lowercase conversion, this maps:
/// - `[` → `{`
/// - `]` → `}`
/// - `\` → `|`
/// - `~` → `^`
pub fn irc_to_lower(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '[' => '{',
            ']' => '}',
            '\\' => '|',
            '~' => '^',
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => c,
        })
        .collect()
}

/// Normalize a user-supplied channel name.
///
/// # Example
///
/// ```
/// use slirc_client::channels::normalize;
///
/// assert_eq!(normalize("Rust").unwrap().to_string(), "#rust");
/// assert_eq!(normalize("&Local[1]").unwrap().to_string(), "&local[1]");
/// assert!(normalize("has space").is_err());
/// ```
pub fn normalize(name: &str) -> Result<Channel, ValueParseError> {
    let lowered = name.to_lowercase();
    if lowered.is_channel_name() {
        lowered.parse()
    } else {
        format!("#{}", lowered)
            .parse()
            .map_err(|_| ValueParseError::Channel(name.to_owned()))
    }
}

fn key(channel: &Channel) -> String {
    irc_to_lower(&channel.to_string())
}

/// Concurrent set of joined channels.
#[derive(Debug, Default)]
pub struct ChannelSet {
    joined: DashMap<String, Channel>,
}

impl ChannelSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `channel` as joined.
    pub fn insert(&self, channel: &Channel) -> Membership {
        match self.joined.entry(key(channel)) {
            Entry::Occupied(_) => Membership::Unchanged,
            Entry::Vacant(slot) => {
                slot.insert(channel.clone());
                Membership::Changed
            }
        }
    }

    /// Forget `channel`.
    pub fn remove(&self, channel: &Channel) -> Membership {
        match self.joined.remove(&key(channel)) {
            Some(_) => Membership::Changed,
            None => Membership::Unchanged,
        }
    }

    /// Whether `channel` is joined.
    pub fn contains(&self, channel: &Channel) -> bool {
        self.joined.contains_key(&key(channel))
    }

    /// Number of joined channels.
    pub fn len(&self) -> usize {
        self.joined.len()
    }

    /// Whether no channel is joined.
    pub fn is_empty(&self) -> bool {
        self.joined.is_empty()
    }

    /// A snapshot of the joined channels, sorted by name.
    pub fn snapshot(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self.joined.iter().map(|e| e.value().clone()).collect();
        channels.sort_by_key(ToString::to_string);
        channels
    }
}
