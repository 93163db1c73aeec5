//! Line parsing entry points.

use std::str::FromStr;

use crate::error::LineParseError;

use super::draft::CommandDraft;
use super::nom_parser;
use super::types::Message;

/// Parse one line, with or without its CRLF terminator, into a draft.
///
/// # Example
///
/// ```
/// use slirc_client::message::parse;
/// use slirc_client::Prefix;
///
/// let draft = parse(":bob!user@host COMMAND\r\n").unwrap();
/// assert_eq!(draft.prefix, Some(Prefix::new("bob", "user", "host")));
/// assert_eq!(draft.verb, "COMMAND");
///
/// let err = parse("PRIVMSG #a\0b").unwrap_err();
/// assert_eq!(err.offset, 10);
/// ```
pub fn parse(line: &str) -> Result<CommandDraft, LineParseError> {
    nom_parser::parse_line(line)
}

impl FromStr for Message {
    type Err = LineParseError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        parse(s).map(CommandDraft::freeze)
    }
}
