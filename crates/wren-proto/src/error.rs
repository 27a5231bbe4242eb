//! Protocol error types.

use std::io;

use thiserror::Error;

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced by the codec and message layer.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The raw line that failed to parse.
        string: String,
        #[source]
        cause: MessageParseError,
    },

    #[error("message of {actual} bytes exceeds the {limit} byte limit")]
    MessageTooLong { actual: usize, limit: usize },

    #[error("line is not valid utf-8")]
    InvalidUtf8,
}

/// Errors from parsing one message into its typed representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageParseError {
    #[error("empty message")]
    EmptyMessage,

    #[error("message has no command")]
    InvalidCommand,

    #[error("{command} is missing required parameters")]
    MissingParams { command: String },

    #[error("invalid mode arguments: {0}")]
    InvalidModeArg(String),
}

impl ProtocolError {
    /// The parse cause, when this error wraps a failed message parse.
    pub fn parse_cause(&self) -> Option<&MessageParseError> {
        match self {
            Self::InvalidMessage { cause, .. } => Some(cause),
            _ => None,
        }
    }
}
