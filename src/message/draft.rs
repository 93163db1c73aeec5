//! The mutable accumulator the line parser fills in.

use std::collections::BTreeMap;

use crate::prefix::Prefix;

use super::tags::TagKey;
use super::types::Message;

/// A line broken into its parts, before classification.
///
/// A draft lives for one parse call and is then frozen into a [`Message`].
/// Tag values are kept as the escaped wire text; a repeated key keeps its
/// last value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandDraft {
    /// Message tags.
    pub tags: BTreeMap<TagKey, Option<String>>,
    /// Message source.
    pub prefix: Option<Prefix>,
    /// Alphabetic verb or three-digit numeric.
    pub verb: String,
    /// Middle parameters, at most fourteen.
    pub params: Vec<String>,
    /// The `:`-introduced final parameter.
    pub trailing: Option<String>,
}

impl CommandDraft {
    /// Record a tag, replacing an earlier one with the same key.
    pub fn tag(&mut self, key: TagKey, value: Option<String>) -> &mut Self {
        self.tags.insert(key, value);
        self
    }

    /// Append a middle parameter.
    pub fn param(&mut self, param: impl Into<String>) -> &mut Self {
        self.params.push(param.into());
        self
    }

    /// Freeze into an immutable [`Message`].
    pub fn freeze(self) -> Message {
        Message::from_draft(self)
    }
}
