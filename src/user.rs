//! Users named by commands.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::ValueParseError;

/// A user, identified by nickname.
///
/// Equality and hashing look at the nickname only and are case-sensitive;
/// the user and host parts are informational.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    nickname: String,
    user: Option<String>,
    host: Option<String>,
}

impl User {
    /// A user known only by nickname.
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            user: None,
            host: None,
        }
    }

    /// A user with its full mask.
    pub fn with_mask(nickname: String, user: Option<String>, host: Option<String>) -> Self {
        Self {
            nickname,
            user,
            host,
        }
    }

    /// The nickname.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// The username, if known.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The hostname, if known.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.nickname == other.nickname
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nickname.hash(state);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nickname)?;
        if let Some(user) = &self.user {
            write!(f, "!{}", user)?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{}", host)?;
        }
        Ok(())
    }
}

impl FromStr for User {
    type Err = ValueParseError;

    /// Split a `nick[!user][@host]` mask.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rest, host) = match s.split_once('@') {
            Some((rest, host)) => (rest, Some(host)),
            None => (s, None),
        };
        let (nickname, user) = match rest.split_once('!') {
            Some((nick, user)) => (nick, Some(user)),
            None => (rest, None),
        };

        let empty = |part: Option<&str>| part.is_some_and(str::is_empty);
        if nickname.is_empty() || empty(user) || empty(host) || s.contains(' ') {
            return Err(ValueParseError::User(s.to_owned()));
        }

        Ok(User::with_mask(
            nickname.to_owned(),
            user.map(str::to_owned),
            host.map(str::to_owned),
        ))
    }
}
