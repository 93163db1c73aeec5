//! Automatic replies to server PINGs.

use crate::command::Command;
use crate::message::Message;

/// The `PONG :<host>` line answering `command`, if it is a PING.
///
/// # Example
///
/// ```
/// use slirc_client::{keepalive, Command};
///
/// let ping = Command::from_line("PING :tmi.twitch.tv\r\n");
/// assert_eq!(keepalive::respond(&ping).as_deref(), Some("PONG :tmi.twitch.tv"));
/// ```
pub fn respond(command: &Command) -> Option<String> {
    match command {
        Command::Ping { host, .. } => Some(pong(host)),
        _ => None,
    }
}

/// A `PONG :<host>` line.
pub fn pong(host: &str) -> String {
    Message::new("PONG").with_trailing(host).to_string()
}
