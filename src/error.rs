//! Error types for the client protocol engine.
//!
//! Errors are split by the stage that produces them: lexical failures from
//! the line parser, semantic failures from command classification, invalid
//! setup detected at connect time, and failures of the underlying transport.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// A line failed the wire grammar.
    #[error(transparent)]
    Parse(#[from] LineParseError),

    /// A line parsed but lacks a field its verb requires.
    #[error("invalid command in {raw_line:?}: {cause}")]
    Semantic {
        /// The raw line the command was parsed from.
        raw_line: String,
        /// The underlying classification error.
        #[source]
        cause: SemanticCommandError,
    },

    /// The client was set up incorrectly.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A caller-supplied value, such as a channel name, is malformed.
    #[error(transparent)]
    InvalidValue(#[from] ValueParseError),

    /// The transport failed.
    #[cfg(feature = "tokio")]
    #[error(transparent)]
    Transport(#[from] crate::transport::TransportError),
}

/// A lexical or grammar failure at a specific offset of a raw line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parsing failed at offset {offset}{}: {raw_line:?}", context_suffix(.context))]
pub struct LineParseError {
    /// Byte offset into `raw_line` where parsing stopped.
    pub offset: usize,
    /// The offending line, verbatim.
    pub raw_line: String,
    /// The innermost grammar rule being parsed, if known.
    pub context: Option<&'static str>,
}

fn context_suffix(context: &Option<&'static str>) -> String {
    match context {
        Some(ctx) => format!(" while {}", ctx),
        None => String::new(),
    }
}

impl LineParseError {
    /// Create an error for `raw_line` at `offset`.
    pub fn new(raw_line: impl Into<String>, offset: usize) -> Self {
        Self {
            offset,
            raw_line: raw_line.into(),
            context: None,
        }
    }

    /// The unparsed remainder of the line, starting at the failure offset.
    pub fn remainder(&self) -> &str {
        self.raw_line.get(self.offset..).unwrap_or("")
    }
}

/// Why a line became an invalid command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    /// The line failed the wire grammar.
    #[error(transparent)]
    Parse(#[from] LineParseError),

    /// The line parsed but its verb's required fields are missing.
    #[error(transparent)]
    Semantic(#[from] SemanticCommandError),
}

impl LineError {
    /// Attach the raw line and lift into a [`ProtocolError`].
    pub fn into_protocol_error(self, raw_line: &str) -> ProtocolError {
        match self {
            LineError::Parse(e) => ProtocolError::Parse(e),
            LineError::Semantic(cause) => ProtocolError::Semantic {
                raw_line: raw_line.to_owned(),
                cause,
            },
        }
    }
}

/// A grammatically valid line whose verb is missing a required field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SemanticCommandError {
    /// A positional parameter is absent.
    #[error("{verb} requires parameter {index}")]
    MissingParameter {
        /// The command verb.
        verb: String,
        /// Zero-based parameter index.
        index: usize,
    },

    /// The trailing parameter is absent.
    #[error("{verb} requires a trailing parameter")]
    MissingTrailing {
        /// The command verb.
        verb: String,
    },

    /// A parameter that must name a channel does not.
    #[error("{verb} parameter {index} is not a channel: {value:?}")]
    InvalidChannel {
        /// The command verb.
        verb: String,
        /// Zero-based parameter index.
        index: usize,
        /// The offending parameter text.
        value: String,
    },

    /// A parameter that must name a user is empty.
    #[error("{verb} parameter {index} is not a user: {value:?}")]
    InvalidUser {
        /// The command verb.
        verb: String,
        /// Zero-based parameter index.
        index: usize,
        /// The offending parameter text.
        value: String,
    },
}

/// Invalid client setup, detected synchronously before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// No nickname was configured.
    #[error("a nickname must be provided")]
    MissingNickname,

    /// No transport or server endpoint was configured.
    #[error("a transport must be provided")]
    MissingTransport,

    /// A configured capability does not follow the capability grammar.
    #[error("invalid capability: {0}")]
    InvalidCapability(#[source] ValueParseError),
}

/// Errors from parsing value types out of strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValueParseError {
    /// Not a valid `[vendor/]name` capability.
    #[error("invalid capability: {0:?}")]
    Capability(String),

    /// Not a valid channel name.
    #[error("invalid channel: {0:?}")]
    Channel(String),

    /// Not a valid `[+][vendor/]name` tag key.
    #[error("invalid tag key: {0:?}")]
    TagKey(String),

    /// Not a valid user mask.
    #[error("invalid user: {0:?}")]
    User(String),

    /// Not a valid message prefix.
    #[error("invalid prefix: {0:?}")]
    Prefix(String),
}
