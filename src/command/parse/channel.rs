use super::super::types::Command;
use super::Args;
use crate::chan::Channel;
use crate::error::SemanticCommandError;
use crate::message::Message;
use crate::user::User;

enum Fields {
    Join(Channel),
    Part(Channel),
    Mode(Channel, Vec<String>),
    Topic(Channel, Option<String>),
    Invite(User, Channel),
    Kick(Vec<Channel>, Vec<User>, Option<String>),
}

fn fields(verb: &str, message: &Message) -> Result<Fields, SemanticCommandError> {
    let args = Args::new(verb, message);

    let fields = match verb {
        // Some servers send `JOIN :#channel`.
        "JOIN" | "PART" => {
            let channel = args.to_channel(0, args.param_or_trailing(0)?)?;
            if verb == "JOIN" {
                Fields::Join(channel)
            } else {
                Fields::Part(channel)
            }
        }
        "MODE" => {
            let channel = args.channel(0)?;
            let modes = message
                .params()
                .iter()
                .skip(1)
                .cloned()
                .chain(message.trailing().map(str::to_owned))
                .collect();
            Fields::Mode(channel, modes)
        }
        "TOPIC" => Fields::Topic(args.channel(0)?, args.optional_trailing()),
        "INVITE" => Fields::Invite(args.user(0)?, args.channel(1)?),
        _ => {
            let channels = args
                .param(0)?
                .split(',')
                .map(|c| args.to_channel(0, c))
                .collect::<Result<Vec<_>, _>>()?;
            let users = args
                .param(1)?
                .split(',')
                .map(|u| args.to_user(1, u))
                .collect::<Result<Vec<_>, _>>()?;
            Fields::Kick(channels, users, args.optional_trailing())
        }
    };
    Ok(fields)
}

pub(super) fn parse(
    verb: &str,
    message: Message,
) -> Result<Command, (Message, SemanticCommandError)> {
    let fields = match fields(verb, &message) {
        Ok(fields) => fields,
        Err(e) => return Err((message, e)),
    };

    let command = match fields {
        Fields::Join(channel) => Command::Join { message, channel },
        Fields::Part(channel) => Command::Part { message, channel },
        Fields::Mode(channel, modes) => Command::Mode {
            message,
            channel,
            modes,
        },
        Fields::Topic(channel, topic) => Command::Topic {
            message,
            channel,
            topic,
        },
        Fields::Invite(user, channel) => Command::Invite {
            message,
            user,
            channel,
        },
        Fields::Kick(channels, users, comment) => Command::Kick {
            message,
            channels,
            users,
            comment,
        },
    };

    Ok(command)
}
