//! Message prefixes (the `:source` of a line).

use std::fmt;

/// The source of an IRC message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prefix {
    /// A server name (contains a `.`, never `!` or `@`).
    ServerName(String),
    /// A user source: nick, user, host. User and host may be empty when
    /// the sender only supplied a bare nick.
    Nickname(String, String, String),
}

impl Prefix {
    /// Build a full `nick!user@host` prefix.
    pub fn new(nick: &str, user: &str, host: &str) -> Prefix {
        Prefix::Nickname(nick.to_string(), user.to_string(), host.to_string())
    }

    /// Parse a prefix from its wire form (without the leading `:`).
    pub fn parse(s: &str) -> Prefix {
        let (rest, host) = match s.split_once('@') {
            Some((rest, host)) => (rest, host),
            None => (s, ""),
        };
        let (nick, user) = match rest.split_once('!') {
            Some((nick, user)) => (nick, user),
            None => (rest, ""),
        };

        if user.is_empty() && host.is_empty() && nick.contains('.') {
            Prefix::ServerName(nick.to_string())
        } else {
            Prefix::Nickname(nick.to_string(), user.to_string(), host.to_string())
        }
    }

    /// The nickname, when this prefix names a user.
    pub fn nickname(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) => Some(nick),
            Prefix::ServerName(_) => None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => write!(f, "{}", name),
            Prefix::Nickname(nick, user, host) => {
                write!(f, "{}", nick)?;
                if !user.is_empty() {
                    write!(f, "!{}", user)?;
                }
                if !host.is_empty() {
                    write!(f, "@{}", host)?;
                }
                Ok(())
            }
        }
    }
}
