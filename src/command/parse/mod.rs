mod channel;
mod connection;
mod messaging;

use std::str::FromStr;

use super::types::Command;
use crate::chan::Channel;
use crate::error::{LineError, ProtocolError, SemanticCommandError};
use crate::message::nom_parser::is_numeric_verb;
use crate::message::{parse, CommandDraft, Message};
use crate::user::User;

/// Classify a parsed draft into a typed command.
///
/// # Example
///
/// ```
/// use slirc_client::command::{materialize, Target};
/// use slirc_client::message::parse;
/// use slirc_client::Command;
///
/// let draft = parse("PRIVMSG #foo :hi\r\n").unwrap();
/// match materialize(draft).unwrap() {
///     Command::Privmsg { target, text, .. } => {
///         assert!(matches!(target, Target::Channel(_)));
///         assert_eq!(text, "hi");
///     }
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn materialize(draft: CommandDraft) -> Result<Command, SemanticCommandError> {
    Command::from_message(draft.freeze()).map_err(|(_, e)| e)
}

impl Command {
    /// Classify a message. On failure the message is handed back with the
    /// error.
    pub fn from_message(message: Message) -> Result<Command, (Message, SemanticCommandError)> {
        let verb = message.verb().to_owned();
        let verb = verb.as_str();

        match verb {
            "PRIVMSG" | "NOTICE" | "WHISPER" | "SQUERY" => messaging::parse(verb, message),

            "JOIN" | "PART" | "TOPIC" | "MODE" | "INVITE" | "KICK" => {
                channel::parse(verb, message)
            }

            "NICK" | "PING" | "PONG" | "ERROR" | "QUIT" => connection::parse(verb, message),

            _ if is_numeric_verb(verb) => match verb.parse::<u16>() {
                Ok(code) => Ok(Command::NumericReply { message, code }),
                Err(_) => Ok(Command::Generic { message }),
            },

            _ => Ok(Command::Generic { message }),
        }
    }

    /// Parse and classify one raw line. Failures become
    /// [`Command::Invalid`]; this never returns an error.
    pub fn from_line(line: &str) -> Command {
        let raw_line = line.strip_suffix("\r\n").unwrap_or(line);
        match parse(line) {
            Ok(draft) => match Command::from_message(draft.freeze()) {
                Ok(command) => command,
                Err((message, e)) => Command::Invalid {
                    raw_line: raw_line.to_owned(),
                    message: Some(message),
                    error: LineError::Semantic(e),
                },
            },
            Err(e) => Command::Invalid {
                raw_line: raw_line.to_owned(),
                message: None,
                error: LineError::Parse(e),
            },
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    /// Parse and classify one raw line, returning failures as errors.
    fn from_str(s: &str) -> Result<Command, Self::Err> {
        match Command::from_line(s) {
            Command::Invalid {
                raw_line, error, ..
            } => Err(error.into_protocol_error(&raw_line)),
            command => Ok(command),
        }
    }
}

/// Verb-aware parameter access that reports missing fields.
pub(super) struct Args<'a> {
    verb: &'a str,
    message: &'a Message,
}

impl<'a> Args<'a> {
    pub(super) fn new(verb: &'a str, message: &'a Message) -> Self {
        Self { verb, message }
    }

    pub(super) fn param(&self, index: usize) -> Result<&'a str, SemanticCommandError> {
        self.message
            .param(index)
            .ok_or_else(|| SemanticCommandError::MissingParameter {
                verb: self.verb.to_owned(),
                index,
            })
    }

    /// Parameter `index`, or the trailing parameter when it sits in that
    /// position (`NICK :new`).
    pub(super) fn param_or_trailing(&self, index: usize) -> Result<&'a str, SemanticCommandError> {
        match self.message.param(index) {
            Some(param) => Ok(param),
            None if self.message.params().len() == index => self
                .message
                .trailing()
                .ok_or_else(|| SemanticCommandError::MissingParameter {
                    verb: self.verb.to_owned(),
                    index,
                }),
            None => Err(SemanticCommandError::MissingParameter {
                verb: self.verb.to_owned(),
                index,
            }),
        }
    }

    pub(super) fn trailing(&self) -> Result<&'a str, SemanticCommandError> {
        self.message
            .trailing()
            .ok_or_else(|| SemanticCommandError::MissingTrailing {
                verb: self.verb.to_owned(),
            })
    }

    pub(super) fn optional_trailing(&self) -> Option<String> {
        self.message.trailing().map(str::to_owned)
    }

    pub(super) fn channel(&self, index: usize) -> Result<Channel, SemanticCommandError> {
        let value = self.param(index)?;
        self.to_channel(index, value)
    }

    pub(super) fn to_channel(&self, index: usize, value: &str) -> Result<Channel, SemanticCommandError> {
        value
            .parse()
            .map_err(|_| SemanticCommandError::InvalidChannel {
                verb: self.verb.to_owned(),
                index,
                value: value.to_owned(),
            })
    }

    pub(super) fn to_user(&self, index: usize, value: &str) -> Result<User, SemanticCommandError> {
        value
            .parse()
            .map_err(|_| SemanticCommandError::InvalidUser {
                verb: self.verb.to_owned(),
                index,
                value: value.to_owned(),
            })
    }

    pub(super) fn user(&self, index: usize) -> Result<User, SemanticCommandError> {
        let value = self.param(index)?;
        self.to_user(index, value)
    }
}
