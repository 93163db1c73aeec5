use super::super::types::{Command, Origin, Target};
use super::Args;
use crate::ctcp;
use crate::error::SemanticCommandError;
use crate::message::Message;
use crate::user::User;

enum Addressee {
    Target(Target),
    User(User),
}

fn fields(verb: &str, message: &Message) -> Result<(Addressee, String), SemanticCommandError> {
    let args = Args::new(verb, message);
    let target = args.param(0)?;
    let text = args.param_or_trailing(1)?.to_owned();

    let addressee = match verb {
        "PRIVMSG" | "NOTICE" => Addressee::Target(Target::resolve(target)),
        _ => Addressee::User(args.to_user(0, target)?),
    };
    Ok((addressee, text))
}

pub(super) fn parse(
    verb: &str,
    message: Message,
) -> Result<Command, (Message, SemanticCommandError)> {
    let (addressee, text) = match fields(verb, &message) {
        Ok(fields) => fields,
        Err(e) => return Err((message, e)),
    };

    let command = match (verb, addressee) {
        ("PRIVMSG", Addressee::Target(target)) => {
            let action = ctcp::action_text(&text).map(str::to_owned);
            let (text, is_action) = match action {
                Some(action) => (action, true),
                None => (text, false),
            };
            Command::Privmsg {
                message,
                target,
                text,
                is_action,
            }
        }
        (_, Addressee::Target(target)) => Command::Notice {
            message,
            target,
            text,
        },
        ("WHISPER", Addressee::User(target)) => Command::Whisper {
            message,
            target,
            text,
            origin: Origin::Twitch,
        },
        (_, Addressee::User(target)) => Command::Squery {
            message,
            target,
            text,
        },
    };

    Ok(command)
}
