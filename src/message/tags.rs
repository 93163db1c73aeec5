//! IRCv3 message tag keys and value escaping.
//!
//! The line parser stores tag values exactly as they appear on the wire.
//! [`unescape_tag_value`] is the later stage that turns wire text into the
//! logical value, and [`escape_tag_value`] reverses it.

use std::fmt::{self, Result as FmtResult, Write};
use std::str::FromStr;

use crate::error::ValueParseError;

use super::nom_parser;

/// The key of a message tag: `[+][vendor/]name`.
///
/// Two keys are equal only when the client-only marker, the vendor and the
/// name all match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagKey {
    client_only: bool,
    vendor: Option<String>,
    name: String,
}

impl TagKey {
    /// A plain server tag key with no vendor.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            client_only: false,
            vendor: None,
            name: name.into(),
        }
    }

    /// A tag key with every component given.
    pub fn with_parts(client_only: bool, vendor: Option<String>, name: impl Into<String>) -> Self {
        Self {
            client_only,
            vendor,
            name: name.into(),
        }
    }

    /// Whether the key carried the `+` client-only marker.
    pub fn is_client_only(&self) -> bool {
        self.client_only
    }

    /// The vendor namespace, e.g. `twitch.tv`.
    pub fn vendor(&self) -> Option<&str> {
        self.vendor.as_deref()
    }

    /// The bare key name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> FmtResult {
        if self.client_only {
            f.write_char('+')?;
        }
        if let Some(vendor) = &self.vendor {
            write!(f, "{}/", vendor)?;
        }
        f.write_str(&self.name)
    }
}

impl FromStr for TagKey {
    type Err = ValueParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        nom_parser::complete(nom_parser::tag_key, s)
            .ok_or_else(|| ValueParseError::TagKey(s.to_owned()))
    }
}

impl From<&str> for TagKey {
    /// Lenient conversion: anything that is not a well-formed key becomes a
    /// plain key with the whole text as its name.
    fn from(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| TagKey::new(s))
    }
}

/// Escape a tag value for serialization.
///
/// Escapes special characters according to the IRCv3 message-tags spec.
pub fn escape_tag_value(f: &mut dyn Write, value: &str) -> FmtResult {
    for c in value.chars() {
        match c {
            ';' => f.write_str("\\:")?,
            ' ' => f.write_str("\\s")?,
            '\\' => f.write_str("\\\\")?,
            '\r' => f.write_str("\\r")?,
            '\n' => f.write_str("\\n")?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

/// Unescape a tag value from wire format.
///
/// Understands the IRCv3 escapes (`\:`, `\s`, `\\`, `\r`, `\n`). Any other
/// escaped character stands for itself, which also covers the raw
/// backslash-before-delimiter form the line parser accepts. A lone trailing
/// backslash is dropped.
pub fn unescape_tag_value(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut iter = value.chars();
    while let Some(c) = iter.next() {
        let r = if c == '\\' {
            match iter.next() {
                Some(':') => ';',
                Some('s') => ' ',
                Some('r') => '\r',
                Some('n') => '\n',
                Some(c) => c,
                None => break,
            }
        } else {
            c
        };
        unescaped.push(r);
    }
    unescaped
}
