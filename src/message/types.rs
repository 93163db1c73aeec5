use std::collections::BTreeMap;

use crate::prefix::Prefix;

use super::draft::CommandDraft;
use super::tags::{escape_tag_value, unescape_tag_value, TagKey};

/// The common fields of every command: tags, prefix, verb and parameters.
///
/// A `Message` is immutable once built. Lines are parsed with
/// [`str::parse`] and rendered, without the CRLF terminator, with
/// [`ToString`].
///
/// # Example
///
/// ```
/// use slirc_client::Message;
///
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// assert_eq!(msg.verb(), "PRIVMSG");
/// assert_eq!(msg.param(0), Some("#channel"));
/// assert_eq!(msg.trailing(), Some("Hello!"));
///
/// let out = Message::new("PRIVMSG").with_param("#channel").with_trailing("Hi");
/// assert_eq!(out.to_string(), "PRIVMSG #channel :Hi");
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub(super) tags: BTreeMap<TagKey, Option<String>>,
    pub(super) prefix: Option<Prefix>,
    pub(super) verb: String,
    pub(super) params: Vec<String>,
    pub(super) trailing: Option<String>,
}

impl Message {
    /// Start an outbound message with the given verb.
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            tags: BTreeMap::new(),
            prefix: None,
            verb: verb.into(),
            params: Vec::new(),
            trailing: None,
        }
    }

    pub(super) fn from_draft(draft: CommandDraft) -> Self {
        Self {
            tags: draft.tags,
            prefix: draft.prefix,
            verb: draft.verb,
            params: draft.params,
            trailing: draft.trailing,
        }
    }

    /// A copy with the same tags, prefix and verb but no parameters.
    pub(crate) fn envelope(&self) -> Message {
        Self {
            tags: self.tags.clone(),
            prefix: self.prefix.clone(),
            verb: self.verb.clone(),
            params: Vec::new(),
            trailing: None,
        }
    }

    /// Append a middle parameter.
    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Set the trailing parameter.
    #[must_use]
    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Set the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Add a tag. `value` is the logical value and is escaped for the wire.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<TagKey>, value: Option<&str>) -> Self {
        let value = value.map(|v| {
            let mut escaped = String::with_capacity(v.len());
            // Writing into a String cannot fail.
            let _ = escape_tag_value(&mut escaped, v);
            escaped
        });
        self.tags.insert(key.into(), value);
        self
    }

    /// All tags, with values as escaped wire text.
    pub fn tags(&self) -> &BTreeMap<TagKey, Option<String>> {
        &self.tags
    }

    /// The escaped value of the tag whose canonical form is `key`.
    ///
    /// Returns `None` both for a missing tag and for a key-only tag; use
    /// [`Message::has_tag`] to tell them apart.
    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.find_tag(key).and_then(|(_, v)| v.as_deref())
    }

    /// The unescaped value of the tag whose canonical form is `key`.
    pub fn unescaped_tag_value(&self, key: &str) -> Option<String> {
        self.tag_value(key).map(unescape_tag_value)
    }

    /// Whether a tag with canonical form `key` is present.
    pub fn has_tag(&self, key: &str) -> bool {
        self.find_tag(key).is_some()
    }

    fn find_tag(&self, key: &str) -> Option<(&TagKey, &Option<String>)> {
        match key.parse::<TagKey>() {
            Ok(key) => self.tags.get_key_value(&key),
            Err(_) => None,
        }
    }

    /// Message source.
    pub fn prefix(&self) -> Option<&Prefix> {
        self.prefix.as_ref()
    }

    /// Get the nickname from the message prefix, if present.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nick)
    }

    /// The verb as sent.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Middle parameters.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The middle parameter at `index`.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The trailing parameter.
    pub fn trailing(&self) -> Option<&str> {
        self.trailing.as_deref()
    }
}
