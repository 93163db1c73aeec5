//! Sans-IO registration handshake.
//!
//! The machine produces the lines that open a session (`CAP REQ`, `PASS`,
//! `NICK`, `USER`) in the order the server expects. It does no I/O and never
//! waits for server replies: each step only says whether the caller must
//! see the step's send complete before moving on.
//!
//! # Example
//!
//! ```
//! use slirc_client::state::{HandshakeConfig, HandshakeMachine};
//!
//! let config = HandshakeConfig::new("n")
//!     .with_password("pw")
//!     .with_capabilities(["a/b"])
//!     .unwrap();
//!
//! let mut machine = HandshakeMachine::new(config);
//! let mut lines = Vec::new();
//! while let Some(step) = machine.advance() {
//!     // Send step.lines; if step.await_completion, wait for the send to
//!     // finish before advancing.
//!     lines.extend(step.lines);
//! }
//! assert_eq!(lines, ["CAP REQ :a/b", "PASS pw", "NICK n", "USER n 0 * :n"]);
//! ```

use crate::caps::Capability;
use crate::error::ConfigurationError;
use crate::message::Message;

/// `USER` mode bit requesting wallops.
pub const MODE_WALLOPS: u8 = 4;
/// `USER` mode bit requesting invisibility.
pub const MODE_INVISIBLE: u8 = 8;

/// Identity and capabilities to register with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HandshakeConfig {
    /// Desired nickname.
    pub nickname: String,
    /// Username (ident). Defaults to the nickname.
    pub user: Option<String>,
    /// Real name. Defaults to the nickname.
    pub realname: Option<String>,
    /// Server password, if required.
    pub password: Option<String>,
    /// Capabilities to request, one `CAP REQ` each.
    pub capabilities: Vec<Capability>,
    /// Request user mode `+i`.
    pub invisible: bool,
    /// Request user mode `+w`.
    pub receive_wallops: bool,
}

impl HandshakeConfig {
    /// A config with only a nickname set.
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            ..Self::default()
        }
    }

    /// Set the server password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the username.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the real name.
    #[must_use]
    pub fn with_realname(mut self, realname: impl Into<String>) -> Self {
        self.realname = Some(realname.into());
        self
    }

    /// Add capabilities from strings, validating each against the
    /// capability grammar.
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for cap in capabilities {
            let cap = cap
                .as_ref()
                .parse()
                .map_err(ConfigurationError::InvalidCapability)?;
            self.capabilities.push(cap);
        }
        Ok(self)
    }

    /// Check the config can be used to register.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.nickname.is_empty() {
            return Err(ConfigurationError::MissingNickname);
        }
        Ok(())
    }

    /// The username sent in `USER`.
    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or(&self.nickname)
    }

    /// The real name sent in `USER`.
    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nickname)
    }

    /// The `USER` mode parameter: 4 for wallops, 8 for invisible.
    pub fn mode_bits(&self) -> u8 {
        let mut bits = 0;
        if self.receive_wallops {
            bits |= MODE_WALLOPS;
        }
        if self.invisible {
            bits |= MODE_INVISIBLE;
        }
        bits
    }
}

/// Progress through the handshake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing sent yet.
    #[default]
    Idle,
    /// `CAP REQ` lines emitted.
    CapabilitiesRequested,
    /// `PASS` emitted.
    PasswordSent,
    /// `NICK` and `USER` emitted; the handshake is done.
    IdentitySent,
}

/// One batch of lines to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakeStep {
    /// Lines without CRLF, in order.
    pub lines: Vec<String>,
    /// Whether the send must complete before the next step is sent.
    pub await_completion: bool,
}

/// Sans-IO state machine for the registration handshake.
#[derive(Clone, Debug)]
pub struct HandshakeMachine {
    config: HandshakeConfig,
    state: HandshakeState,
}

impl HandshakeMachine {
    /// Create a new handshake state machine with the given configuration.
    #[must_use]
    pub fn new(config: HandshakeConfig) -> Self {
        Self {
            config,
            state: HandshakeState::Idle,
        }
    }

    /// Get the current handshake state.
    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether every line has been produced.
    pub fn is_complete(&self) -> bool {
        self.state == HandshakeState::IdentitySent
    }

    /// Produce the next step, moving to the state it represents.
    ///
    /// Capability requests only gate the identity lines when a password is
    /// configured; `PASS` always gates them.
    pub fn advance(&mut self) -> Option<HandshakeStep> {
        loop {
            let (next, step) = match self.state {
                HandshakeState::Idle => (
                    HandshakeState::CapabilitiesRequested,
                    self.capability_step(),
                ),
                HandshakeState::CapabilitiesRequested => {
                    (HandshakeState::PasswordSent, self.password_step())
                }
                HandshakeState::PasswordSent => {
                    (HandshakeState::IdentitySent, Some(self.identity_step()))
                }
                HandshakeState::IdentitySent => return None,
            };
            self.state = next;
            if step.is_some() {
                return step;
            }
        }
    }

    fn capability_step(&self) -> Option<HandshakeStep> {
        if self.config.capabilities.is_empty() {
            return None;
        }
        let lines = self
            .config
            .capabilities
            .iter()
            .map(|cap| {
                Message::new("CAP")
                    .with_param("REQ")
                    .with_trailing(cap.to_string())
                    .to_string()
            })
            .collect();
        Some(HandshakeStep {
            lines,
            await_completion: self.config.password.is_some(),
        })
    }

    fn password_step(&self) -> Option<HandshakeStep> {
        let password = self.config.password.as_ref()?;
        Some(HandshakeStep {
            lines: vec![Message::new("PASS").with_param(password.as_str()).to_string()],
            await_completion: true,
        })
    }

    fn identity_step(&self) -> HandshakeStep {
        let config = &self.config;
        let nick = Message::new("NICK").with_param(config.nickname.as_str());
        let user = Message::new("USER")
            .with_param(config.user())
            .with_param(config.mode_bits().to_string())
            .with_param("*")
            .with_trailing(config.realname());
        HandshakeStep {
            lines: vec![nick.to_string(), user.to_string()],
            await_completion: false,
        }
    }
}
