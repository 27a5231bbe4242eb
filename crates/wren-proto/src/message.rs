//! Owned IRC messages: parsing and wire serialization.

use std::fmt;
use std::str::FromStr;

use crate::command::Command;
use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;
use crate::response::Response;

/// A complete IRC message: optional source prefix plus a typed command.
///
/// ```
/// use wren_proto::{Command, Message};
///
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// assert!(matches!(msg.command, Command::PRIVMSG(_, _)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// The message source, when known.
    pub prefix: Option<Prefix>,
    /// The command and its parameters.
    pub command: Command,
}

impl Message {
    /// Attach a prefix to this message.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// The nickname of the message source, if any.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(|p| p.nickname())
    }

    /// Create a PRIVMSG to a target.
    #[must_use]
    pub fn privmsg<T, M>(target: T, text: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Command::PRIVMSG(target.into(), text.into()).into()
    }

    /// Create a NOTICE to a target.
    #[must_use]
    pub fn notice<T, M>(target: T, text: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Command::NOTICE(target.into(), text.into()).into()
    }

    /// Create a PING carrying a token.
    #[must_use]
    pub fn ping<S>(token: S) -> Self
    where
        S: Into<String>,
    {
        Command::PING(token.into(), None).into()
    }

    /// Create a PONG from a server carrying the PING token back.
    #[must_use]
    pub fn pong<S, T>(server: S, token: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Command::PONG(server.into(), Some(token.into())).into()
    }

    /// Create the ERROR line sent while closing a link.
    #[must_use]
    pub fn error<M>(text: M) -> Self
    where
        M: Into<String>,
    {
        Command::ERROR(text.into()).into()
    }

    /// The numeric reply carried by this message, if it is one.
    pub fn response(&self) -> Option<Response> {
        match &self.command {
            Command::Response(resp, _) => Some(*resp),
            _ => None,
        }
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Message {
        Message {
            prefix: None,
            command,
        }
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        let invalid = |cause: MessageParseError| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        };

        let mut rest = s.trim_end_matches(['\r', '\n']);
        if rest.is_empty() {
            return Err(invalid(MessageParseError::EmptyMessage));
        }

        let prefix = if let Some(after) = rest.strip_prefix(':') {
            let (raw_prefix, tail) = after
                .split_once(' ')
                .ok_or_else(|| invalid(MessageParseError::InvalidCommand))?;
            rest = tail.trim_start_matches(' ');
            Some(Prefix::parse(raw_prefix))
        } else {
            None
        };

        let (word, tail) = match rest.split_once(' ') {
            Some((word, tail)) => (word, tail.trim_start_matches(' ')),
            None => (rest, ""),
        };
        if word.is_empty() {
            return Err(invalid(MessageParseError::InvalidCommand));
        }

        let mut params: Vec<&str> = Vec::new();
        let mut remaining = tail;
        while !remaining.is_empty() {
            if let Some(trailing) = remaining.strip_prefix(':') {
                params.push(trailing);
                break;
            }
            match remaining.split_once(' ') {
                Some((param, tail)) => {
                    params.push(param);
                    remaining = tail.trim_start_matches(' ');
                }
                None => {
                    params.push(remaining);
                    break;
                }
            }
        }

        let command = Command::new(word, params).map_err(invalid)?;
        Ok(Message { prefix, command })
    }
}

impl fmt::Display for Message {
    /// Serialize to wire format, CRLF-terminated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        write!(f, "{}", self.command.name())?;

        let params = self.command.params();
        let last = params.len().saturating_sub(1);
        for (i, param) in params.iter().enumerate() {
            let needs_colon =
                i == last && (param.is_empty() || param.contains(' ') || param.starts_with(':'));
            if needs_colon {
                write!(f, " :{}", param)?;
            } else {
                write!(f, " {}", param)?;
            }
        }
        write!(f, "\r\n")
    }
}
