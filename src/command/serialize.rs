use std::fmt;

use super::types::Command;
use crate::ctcp;
use crate::message::Message;

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether `param` can only be sent as the trailing parameter.
fn needs_trailing(param: &str) -> bool {
    param.is_empty() || param.starts_with(':') || param.contains(' ')
}

impl Command {
    /// Rebuild a canonical message from the typed fields.
    ///
    /// Tags, prefix and verb are kept from the original message. Text fields
    /// always go in the trailing parameter. Returns `None` for lines that
    /// failed the grammar.
    pub fn to_message(&self) -> Option<Message> {
        let message = match self {
            Command::Privmsg {
                message,
                target,
                text,
                is_action,
            } => {
                let text = if *is_action {
                    ctcp::format_action(text)
                } else {
                    text.clone()
                };
                message
                    .envelope()
                    .with_param(target.to_string())
                    .with_trailing(text)
            }
            Command::Notice {
                message,
                target,
                text,
            } => message
                .envelope()
                .with_param(target.to_string())
                .with_trailing(text.as_str()),
            Command::Whisper {
                message,
                target,
                text,
                ..
            }
            | Command::Squery {
                message,
                target,
                text,
            } => message
                .envelope()
                .with_param(target.to_string())
                .with_trailing(text.as_str()),
            Command::Join { message, channel } | Command::Part { message, channel } => {
                message.envelope().with_param(channel.to_string())
            }
            Command::Mode {
                message,
                channel,
                modes,
            } => {
                let msg = message.envelope().with_param(channel.to_string());
                match modes.split_last() {
                    Some((last, rest)) => {
                        let msg = rest
                            .iter()
                            .fold(msg, |msg, mode| msg.with_param(mode.as_str()));
                        if needs_trailing(last) {
                            msg.with_trailing(last.as_str())
                        } else {
                            msg.with_param(last.as_str())
                        }
                    }
                    None => msg,
                }
            }
            Command::Topic {
                message,
                channel,
                topic,
            } => {
                let msg = message.envelope().with_param(channel.to_string());
                match topic {
                    Some(topic) => msg.with_trailing(topic.as_str()),
                    None => msg,
                }
            }
            Command::Nick { message, nickname } if needs_trailing(nickname) => {
                message.envelope().with_trailing(nickname.as_str())
            }
            Command::Nick { message, nickname } => {
                message.envelope().with_param(nickname.as_str())
            }
            Command::Invite {
                message,
                user,
                channel,
            } => message
                .envelope()
                .with_param(user.to_string())
                .with_param(channel.to_string()),
            Command::Kick {
                message,
                channels,
                users,
                comment,
            } => {
                let msg = message
                    .envelope()
                    .with_param(join(channels))
                    .with_param(join(users));
                match comment {
                    Some(comment) => msg.with_trailing(comment.as_str()),
                    None => msg,
                }
            }
            Command::Ping { message, host } | Command::Pong { message, host } => {
                message.envelope().with_trailing(host.as_str())
            }
            Command::Error { message, text } | Command::Quit { message, text } => {
                message.envelope().with_trailing(text.as_str())
            }
            Command::NumericReply { message, .. } | Command::Generic { message } => {
                message.clone()
            }
            Command::Invalid { message, .. } => return message.clone(),
        };
        Some(message)
    }
}

impl fmt::Display for Command {
    /// Canonical form without CRLF. Lines that failed the grammar are
    /// written as received.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_message() {
            Some(message) => fmt::Display::fmt(&message, f),
            None => match self {
                Command::Invalid { raw_line, .. } => f.write_str(raw_line),
                _ => Ok(()),
            },
        }
    }
}
