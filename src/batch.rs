//! Splitting raw transport chunks into commands.
//!
//! A chunk may carry several CRLF-terminated lines. Each non-empty line is
//! classified on its own, so one bad line does not affect its neighbours
//! unless [`ParseErrorPolicy::Propagate`] is chosen.

use crate::command::Command;
use crate::error::ProtocolError;

/// What to do with a line that fails parsing or classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ParseErrorPolicy {
    /// Yield a [`Command::Invalid`] in the line's place.
    #[default]
    Emit,
    /// Drop the line and continue.
    Suppress,
    /// Return the error and stop processing the chunk.
    Propagate,
}

/// Non-empty lines of `chunk`, split strictly on CRLF.
pub fn split_lines(chunk: &str) -> impl Iterator<Item = &str> {
    chunk.split("\r\n").filter(|line| !line.is_empty())
}

/// Iterator over the commands in one chunk.
#[derive(Debug)]
pub struct Batch<'a> {
    lines: std::str::Split<'a, &'static str>,
    policy: ParseErrorPolicy,
    halted: bool,
}

impl<'a> Batch<'a> {
    /// Classify the lines of `chunk` under `policy`.
    pub fn new(chunk: &'a str, policy: ParseErrorPolicy) -> Self {
        Self {
            lines: chunk.split("\r\n"),
            policy,
            halted: false,
        }
    }
}

impl Iterator for Batch<'_> {
    type Item = Result<Command, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        for line in self.lines.by_ref() {
            if line.is_empty() {
                continue;
            }
            let command = Command::from_line(line);
            if !command.is_invalid() {
                return Some(Ok(command));
            }
            match self.policy {
                ParseErrorPolicy::Emit => return Some(Ok(command)),
                ParseErrorPolicy::Suppress => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(line, "suppressed invalid line");
                }
                ParseErrorPolicy::Propagate => {
                    self.halted = true;
                    if let Command::Invalid {
                        raw_line, error, ..
                    } = command
                    {
                        return Some(Err(error.into_protocol_error(&raw_line)));
                    }
                }
            }
        }
        None
    }
}

/// Classify every line of `chunk`, stopping at the first error under
/// [`ParseErrorPolicy::Propagate`].
///
/// # Example
///
/// ```
/// use slirc_client::batch::{parse_batch, ParseErrorPolicy};
///
/// let chunk = "PING :a\r\nJOIN nochannel\r\nPING :b\r\n";
/// assert_eq!(parse_batch(chunk, ParseErrorPolicy::Emit).unwrap().len(), 3);
/// assert_eq!(parse_batch(chunk, ParseErrorPolicy::Suppress).unwrap().len(), 2);
/// assert!(parse_batch(chunk, ParseErrorPolicy::Propagate).is_err());
/// ```
pub fn parse_batch(chunk: &str, policy: ParseErrorPolicy) -> Result<Vec<Command>, ProtocolError> {
    Batch::new(chunk, policy).collect()
}
