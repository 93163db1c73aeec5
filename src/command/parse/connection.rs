use super::super::types::Command;
use super::Args;
use crate::error::SemanticCommandError;
use crate::message::Message;

pub(super) fn parse(
    verb: &str,
    message: Message,
) -> Result<Command, (Message, SemanticCommandError)> {
    let args = Args::new(verb, &message);
    let value = match verb {
        "NICK" => args.param_or_trailing(0),
        _ => args.trailing(),
    }
    .map(str::to_owned);

    let value = match value {
        Ok(value) => value,
        Err(e) => return Err((message, e)),
    };

    let command = match verb {
        "NICK" => Command::Nick {
            message,
            nickname: value,
        },
        "PING" => Command::Ping {
            message,
            host: value,
        },
        "PONG" => Command::Pong {
            message,
            host: value,
        },
        "ERROR" => Command::Error {
            message,
            text: value,
        },
        _ => Command::Quit {
            message,
            text: value,
        },
    };

    Ok(command)
}
