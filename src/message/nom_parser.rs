//! Nom-based grammar for IRC lines and the value types embedded in them.
//!
//! ```text
//! message  := ['@' tags SP] [':' prefix SP] command [CRLF]
//! tags     := tag (';' tag)*
//! tag      := ['+'] [vendor '/'] key ['=' value]
//! prefix   := servername | nick [['!' user] '@' host]
//! command  := verb (SP param)* [SP ':' trailing]
//! ```
//!
//! The prefix rule is ambiguous: `irc.example.com` and `bob` are both valid
//! server names and valid nicknames. The server branch is tried first and only
//! wins if it ends exactly at the prefix boundary; otherwise the parser
//! rewinds and tries the nickname branch.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1, take_while_m_n},
    character::complete::{alphanumeric1, char, satisfy},
    combinator::{all_consuming, eof, map, opt, peek, recognize, value, verify},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{many0_count, separated_list1},
    sequence::{pair, preceded, terminated, tuple},
    IResult, Parser,
};

use crate::caps::Capability;
use crate::chan::{Channel, ChannelPrefix};
use crate::error::LineParseError;
use crate::prefix::Prefix;

use super::draft::CommandDraft;
use super::tags::TagKey;

pub(crate) type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Positional parameters allowed before the rest of the line becomes trailing.
pub const MAX_PARAMS: usize = 14;

/// Run `parser` over the whole of `input`, discarding error detail.
pub(crate) fn complete<'a, O, P>(parser: P, input: &'a str) -> Option<O>
where
    P: Parser<&'a str, O, VerboseError<&'a str>>,
{
    all_consuming(parser)(input).ok().map(|(_, out)| out)
}

fn spaces(input: &str) -> ParseResult<'_, &str> {
    take_while1(|c| c == ' ')(input)
}

fn space_follows(input: &str) -> ParseResult<'_, ()> {
    value((), peek(char(' ')))(input)
}

fn end_of_input(input: &str) -> ParseResult<'_, ()> {
    value((), eof)(input)
}

// --- hosts ---------------------------------------------------------------

fn is_host_char(c: char) -> bool {
    // Underscores are not legal in hostnames, but Twitch derives hostnames
    // from nicknames, which may contain them.
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn host_label(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphanumeric()),
        take_while(is_host_char),
    ))(input)
}

/// Dotted hostname; also matches dotted-quad IPv4 addresses.
pub(crate) fn hostname(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(host_label, many0_count(preceded(char('.'), host_label))))(input)
}

fn ipv6(input: &str) -> ParseResult<'_, &str> {
    verify(
        take_while1(|c: char| c.is_ascii_hexdigit() || c == ':' || c == '.'),
        |s: &str| s.contains(':'),
    )(input)
}

fn host(input: &str) -> ParseResult<'_, &str> {
    alt((ipv6, hostname))(input)
}

// --- prefix ----------------------------------------------------------------

fn is_nick_start(c: char) -> bool {
    // Digits are allowed first for Twitch; `[`..`` ` `` and `{`..`}` are the
    // RFC 2812 "special" characters.
    c.is_ascii_alphanumeric() || ('['..='`').contains(&c) || ('{'..='}').contains(&c)
}

fn is_nick_char(c: char) -> bool {
    is_nick_start(c) || c == '-'
}

pub(crate) fn nickname(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(satisfy(is_nick_start), take_while(is_nick_char)))(input)
}

fn username(input: &str) -> ParseResult<'_, &str> {
    take_while1(|c| !matches!(c, ' ' | '\0' | '\r' | '\n' | '@'))(input)
}

type NickParts<'a> = (&'a str, Option<(Option<&'a str>, &'a str)>);

fn nick_prefix(input: &str) -> ParseResult<'_, NickParts<'_>> {
    pair(
        nickname,
        opt(pair(
            opt(preceded(char('!'), username)),
            preceded(char('@'), host),
        )),
    )(input)
}

/// Build a prefix parser that requires `boundary` right after the prefix.
fn prefix_until<'a>(
    boundary: fn(&'a str) -> ParseResult<'a, ()>,
) -> impl FnMut(&'a str) -> ParseResult<'a, Prefix> {
    move |input| {
        let server = map(terminated(alt((ipv6, hostname)), boundary), |name: &str| {
            Prefix::Server {
                name: name.to_owned(),
            }
        });
        let nick = map(terminated(nick_prefix, boundary), |(nick, rest)| {
            let (user, host) = match rest {
                Some((user, host)) => (user.map(str::to_owned), Some(host.to_owned())),
                None => (None, None),
            };
            Prefix::Nickname {
                nick: nick.to_owned(),
                user,
                host,
            }
        });
        context("parsing message prefix", alt((server, nick)))(input)
    }
}

/// A prefix as it appears inside a line, ending at a space.
pub(crate) fn prefix(input: &str) -> ParseResult<'_, Prefix> {
    prefix_until(space_follows)(input)
}

/// A prefix standing alone, ending at end of input.
pub(crate) fn standalone_prefix(input: &str) -> ParseResult<'_, Prefix> {
    prefix_until(end_of_input)(input)
}

// --- tags ------------------------------------------------------------------

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn is_tag_delimiter(c: char) -> bool {
    matches!(c, ' ' | ';' | '\r' | '\n' | '\0')
}

pub(crate) fn tag_key(input: &str) -> ParseResult<'_, TagKey> {
    map(
        tuple((
            opt(char('+')),
            opt(terminated(hostname, char('/'))),
            take_while1(is_key_char),
        )),
        |(plus, vendor, name): (Option<char>, Option<&str>, &str)| {
            TagKey::with_parts(plus.is_some(), vendor.map(str::to_owned), name)
        },
    )(input)
}

/// A tag value, left escaped.
///
/// A backslash always pairs with the character after it, so an escaped
/// delimiter does not end the value.
fn tag_value(input: &str) -> ParseResult<'_, &str> {
    let mut chars = input.char_indices();
    let mut end = input.len();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if is_tag_delimiter(c) {
            end = i;
            break;
        }
    }
    Ok((&input[end..], &input[..end]))
}

fn message_tag(input: &str) -> ParseResult<'_, (TagKey, Option<&str>)> {
    pair(tag_key, opt(preceded(char('='), tag_value)))(input)
}

fn message_tags(input: &str) -> ParseResult<'_, Vec<(TagKey, Option<&str>)>> {
    context(
        "parsing message tags",
        separated_list1(char(';'), message_tag),
    )(input)
}

// --- capabilities and channels -----------------------------------------------

fn vendor_label(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(
        alphanumeric1,
        many0_count(pair(opt(char('-')), alphanumeric1)),
    ))(input)
}

fn capability_vendor(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(
        vendor_label,
        many0_count(preceded(char('.'), vendor_label)),
    ))(input)
}

pub(crate) fn capability(input: &str) -> ParseResult<'_, Capability> {
    map(
        pair(
            opt(terminated(capability_vendor, char('/'))),
            take_while1(is_key_char),
        ),
        |(vendor, name)| Capability::with_vendor(vendor.map(str::to_owned), name),
    )(input)
}

fn is_channel_name_char(c: char) -> bool {
    !matches!(c, ' ' | '\0' | '\r' | '\n' | ':' | ',' | '\x07')
}

fn channel_prefix(input: &str) -> ParseResult<'_, ChannelPrefix> {
    alt((
        value(ChannelPrefix::Network, char('#')),
        value(ChannelPrefix::Modeless, char('+')),
        value(ChannelPrefix::Local, char('&')),
        map(
            preceded(
                char('!'),
                take_while_m_n(5, 5, |c: char| {
                    c.is_ascii_uppercase() || c.is_ascii_digit()
                }),
            ),
            |id: &str| ChannelPrefix::Safe(id.to_owned()),
        ),
    ))(input)
}

pub(crate) fn channel(input: &str) -> ParseResult<'_, Channel> {
    map(
        pair(channel_prefix, take_while1(is_channel_name_char)),
        |(prefix, name)| Channel::from_parts(prefix, name),
    )(input)
}

// --- command -----------------------------------------------------------------

/// A verb is numeric if it is exactly three digits.
pub(crate) fn is_numeric_verb(verb: &str) -> bool {
    verb.len() == 3 && verb.bytes().all(|b| b.is_ascii_digit())
}

fn is_valid_verb(verb: &str) -> bool {
    verb.bytes().all(|b| b.is_ascii_alphabetic()) || is_numeric_verb(verb)
}

fn verb(input: &str) -> ParseResult<'_, &str> {
    context(
        "parsing command verb",
        verify(take_while1(|c: char| c.is_ascii_alphanumeric()), is_valid_verb),
    )(input)
}

fn is_line_end(rest: &str) -> bool {
    rest.is_empty() || rest.starts_with('\r') || rest.starts_with('\n')
}

fn rest_of_line(input: &str) -> ParseResult<'_, &str> {
    take_while(|c| c != '\r' && c != '\n')(input)
}

/// Positional parameters plus the optional trailing parameter.
///
/// Runs of spaces count as one delimiter and spaces before the end of the
/// line are ignored.
fn parameters(input: &str) -> ParseResult<'_, (Vec<&str>, Option<&str>)> {
    let mut params = Vec::new();
    let mut rest = input;

    loop {
        let after_spaces = match spaces(rest) {
            Ok((after, _)) => after,
            Err(_) => break,
        };
        rest = after_spaces;
        if is_line_end(rest) {
            break;
        }

        if let Some(after_colon) = rest.strip_prefix(':') {
            let (after, trailing) = rest_of_line(after_colon)?;
            return Ok((after, (params, Some(trailing))));
        }
        if params.len() == MAX_PARAMS {
            let (after, trailing) = rest_of_line(rest)?;
            return Ok((after, (params, Some(trailing))));
        }

        let (after, param) = context(
            "parsing command parameter",
            take_while1(|c| !matches!(c, ' ' | '\r' | '\n' | '\0')),
        )(rest)?;
        params.push(param);
        rest = after;
    }

    Ok((rest, (params, None)))
}

/// Parse one complete line into a draft.
pub(crate) fn message(input: &str) -> ParseResult<'_, CommandDraft> {
    let mut draft = CommandDraft::default();

    // Once the sigil is seen the section is mandatory; `opt` would hide the
    // real failure behind a verb error.
    let input = match input.strip_prefix('@') {
        Some(rest) => {
            let (rest, tags) = terminated(message_tags, spaces)(rest)?;
            for (key, value) in tags {
                draft.tag(key, value.map(str::to_owned));
            }
            rest
        }
        None => input,
    };

    let input = match input.strip_prefix(':') {
        Some(rest) => {
            let (rest, prefix) = terminated(self::prefix, spaces)(rest)?;
            draft.prefix = Some(prefix);
            rest
        }
        None => input,
    };

    let (input, verb) = verb(input)?;
    draft.verb = verb.to_owned();

    let (input, (params, trailing)) = parameters(input)?;
    for param in params {
        draft.param(param);
    }
    draft.trailing = trailing.map(str::to_owned);

    let (input, _) = context("expecting end of line", pair(opt(tag("\r\n")), eof))(input)?;
    Ok((input, draft))
}

/// Parse `line`, converting nom's error into a [`LineParseError`].
pub(crate) fn parse_line(line: &str) -> Result<CommandDraft, LineParseError> {
    match message(line) {
        Ok((_, draft)) => Ok(draft),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = e
                .errors
                .first()
                .map(|(rest, _)| line.len() - rest.len())
                .unwrap_or(0);
            let context = e.errors.iter().find_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(ctx) => Some(*ctx),
                _ => None,
            });
            Err(LineParseError {
                offset,
                raw_line: line.to_owned(),
                context,
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(LineParseError {
            offset: line.len(),
            raw_line: line.to_owned(),
            context: Some("incomplete input"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix_of(input: &str) -> Prefix {
        prefix(input).expect("prefix should parse").1
    }

    #[test]
    fn test_prefix_server_name() {
        assert_eq!(
            prefix_of("testserver "),
            Prefix::Server {
                name: "testserver".into()
            }
        );
        assert_eq!(
            prefix_of("test_.server.com "),
            Prefix::Server {
                name: "test_.server.com".into()
            }
        );
    }

    #[test]
    fn test_prefix_ipv4_server() {
        assert_eq!(
            prefix_of("127.0.0.1 "),
            Prefix::Server {
                name: "127.0.0.1".into()
            }
        );
    }

    #[test]
    fn test_prefix_falls_back_to_nickname() {
        assert_eq!(
            prefix_of("bob_ted!user@myhost "),
            Prefix::Nickname {
                nick: "bob_ted".into(),
                user: Some("user".into()),
                host: Some("myhost".into()),
            }
        );
        assert_eq!(
            prefix_of("3bobby@server.com "),
            Prefix::Nickname {
                nick: "3bobby".into(),
                user: None,
                host: Some("server.com".into()),
            }
        );
    }

    #[test]
    fn test_prefix_ipv6_host() {
        assert_eq!(
            prefix_of("nick!~u@2001:db8::1 "),
            Prefix::Nickname {
                nick: "nick".into(),
                user: Some("~u".into()),
                host: Some("2001:db8::1".into()),
            }
        );
    }

    #[test]
    fn test_prefix_rejects_unbounded() {
        assert!(prefix("server.com!bob").is_err());
        assert!(prefix("nick!user ").is_err());
        assert!(prefix("bob").is_err());
    }

    #[test]
    fn test_standalone_prefix() {
        let (_, p) = standalone_prefix("irc.example.com").unwrap();
        assert_eq!(
            p,
            Prefix::Server {
                name: "irc.example.com".into()
            }
        );
        assert!(standalone_prefix("irc.example.com ").is_err());
    }

    #[test]
    fn test_tag_value_stops_at_delimiters() {
        assert_eq!(tag_value("value;next").unwrap(), (";next", "value"));
        assert_eq!(tag_value("value rest").unwrap(), (" rest", "value"));
        assert_eq!(tag_value("").unwrap(), ("", ""));
    }

    #[test]
    fn test_tag_value_keeps_escapes() {
        let input = "\\;\\\\\\ \\\r\\\ntest ";
        let (rest, value) = tag_value(input).unwrap();
        assert_eq!(rest, " ");
        assert_eq!(value, "\\;\\\\\\ \\\r\\\ntest");
    }

    #[test]
    fn test_message_tags_multiple() {
        let (rest, tags) = message_tags("key;foo=bar;twitch.tv/msg-id=1 ").unwrap();
        assert_eq!(rest, " ");
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], (TagKey::new("key"), None));
        assert_eq!(tags[1], (TagKey::new("foo"), Some("bar")));
        assert_eq!(
            tags[2],
            (
                TagKey::with_parts(false, Some("twitch.tv".into()), "msg-id"),
                Some("1")
            )
        );
    }

    #[test]
    fn test_verb_rules() {
        assert!(verb("PRIVMSG").is_ok());
        assert!(verb("001").is_ok());
        assert!(verb("0011").is_err());
        assert!(verb("A1").is_err());
        assert!(verb("").is_err());
    }

    #[test]
    fn test_parameters_max_then_trailing() {
        let line = " a b c d e f g h i j k l m n o p";
        let (_, (params, trailing)) = parameters(line).unwrap();
        assert_eq!(params.len(), MAX_PARAMS);
        assert_eq!(trailing, Some("o p"));
    }

    #[test]
    fn test_parameters_tolerate_extra_spaces() {
        let (rest, (params, trailing)) = parameters("  #a   b  \r\n").unwrap();
        assert_eq!(params, vec!["#a", "b"]);
        assert_eq!(trailing, None);
        assert_eq!(rest, "\r\n");
    }

    #[test]
    fn test_parameters_colon_inside_middle() {
        let (_, (params, trailing)) = parameters(" a:b :c d").unwrap();
        assert_eq!(params, vec!["a:b"]);
        assert_eq!(trailing, Some("c d"));
    }

    #[test]
    fn test_parse_line_error_offset() {
        let err = parse_line("PRIVMSG #a\0b").unwrap_err();
        assert_eq!(err.offset, 10);
        assert_eq!(err.raw_line, "PRIVMSG #a\0b");

        let err = parse_line(":server.com!bob PING :x").unwrap_err();
        assert_eq!(err.context, Some("parsing message prefix"));
    }

    #[test]
    fn test_capability_grammar() {
        assert!(complete(capability, "twitch.tv/tags").is_some());
        assert!(complete(capability, "multi-prefix").is_some());
        assert!(complete(capability, "bad--vendor.tv/x").is_none());
        assert!(complete(capability, "a/b/c").is_none());
    }

    #[test]
    fn test_channel_grammar() {
        assert!(complete(channel, "#foo").is_some());
        assert!(complete(channel, "!ABC12safe").is_some());
        assert!(complete(channel, "!abc12safe").is_none());
        assert!(complete(channel, "#").is_none());
        assert!(complete(channel, "#a,b").is_none());
        assert!(complete(channel, "#a\x07").is_none());
    }
}
